use std::collections::BTreeMap;
use std::path::Path;

use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use chrono::{NaiveDate, NaiveDateTime};
use encoding::all::ISO_8859_1;
use encoding::{DecoderTrap, Encoding};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{CaseRecord, CaseTable, LoadSummary};
use super::schema::ColumnSchema;
use crate::config::TextEncoding;
use crate::error::{LoadError, Result};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the case table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, decoded with `encoding`
/// * `.parquet` – any column types; every cell is cast to text first
pub fn load_file(path: &Path, encoding: TextEncoding, schema: &ColumnSchema) -> Result<CaseTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => load_csv(path, encoding, schema)?,
        "parquet" | "pq" => load_parquet(path, schema)?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };

    let s = table.summary;
    log::info!(
        "Loaded {} case records from {} ({} years, {} states)",
        s.rows,
        path.display(),
        table.years.len(),
        table.states.len()
    );
    if s.unparseable_dates > 0 {
        log::warn!("{} date cells could not be parsed and were set to null", s.unparseable_dates);
    }
    if s.invalid_ages > 0 {
        log::warn!("{} age cells were missing, non-numeric or negative", s.invalid_ages);
    }
    if s.invalid_doses > 0 {
        log::warn!("{} dose cells were not integers", s.invalid_doses);
    }
    for column in table.missing_columns(schema) {
        log::warn!("Column {column} not found, its chart stays empty");
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path, encoding: TextEncoding, schema: &ColumnSchema) -> Result<CaseTable> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = decode(bytes, encoding).map_err(|detail| LoadError::Encoding {
        path: path.to_path_buf(),
        encoding: encoding.name(),
        detail,
    })?;
    parse_csv(&text, schema)
}

/// Decode raw file bytes into text.
pub fn decode(bytes: Vec<u8>, encoding: TextEncoding) -> std::result::Result<String, String> {
    match encoding {
        TextEncoding::Latin1 => ISO_8859_1
            .decode(&bytes, DecoderTrap::Strict)
            .map_err(|e| e.into_owned()),
        TextEncoding::Utf8 => {
            let text = String::from_utf8(bytes).map_err(|e| e.to_string())?;
            Ok(match text.strip_prefix('\u{feff}') {
                Some(rest) => rest.to_string(),
                None => text,
            })
        }
    }
}

/// Parse already-decoded CSV text.
pub fn parse_csv(text: &str, schema: &ColumnSchema) -> Result<CaseTable> {
    // short rows leave their trailing cells empty
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut parser = RowParser::new(schema, headers)?;
    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        let cells: Vec<Option<&str>> = record.iter().map(Some).collect();
        records.push(parser.parse_row(&cells));
    }
    Ok(parser.finish(records))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of case records. Works with files written by both
/// **Pandas** (`df.to_parquet()`) and **Polars** (`df.write_parquet()`);
/// numeric and date columns are rendered to text and parsed like CSV cells.
fn load_parquet(path: &Path, schema: &ColumnSchema) -> Result<CaseTable> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let mut parser = RowParser::new(schema, headers)?;
    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result?;
        let columns = batch
            .columns()
            .iter()
            .map(|col| cast(col, &DataType::Utf8))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let strings: Vec<_> = columns.iter().map(|c| c.as_string::<i32>()).collect();

        for row in 0..batch.num_rows() {
            let cells: Vec<Option<&str>> = strings
                .iter()
                .map(|col| (!col.is_null(row)).then(|| col.value(row)))
                .collect();
            records.push(parser.parse_row(&cells));
        }
    }

    Ok(parser.finish(records))
}

// ---------------------------------------------------------------------------
// Row parsing shared by both formats
// ---------------------------------------------------------------------------

struct RowParser {
    headers: Vec<String>,
    year: usize,
    state: usize,
    sex: usize,
    age: Option<usize>,
    investigation_date: Option<usize>,
    death_date: Option<usize>,
    doses: Option<usize>,
    summary: LoadSummary,
}

impl RowParser {
    fn new(schema: &ColumnSchema, headers: Vec<String>) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let require = |name: &str| find(name).ok_or_else(|| LoadError::MissingColumn(name.to_string()));

        let [year, state, sex] = schema.required_columns();
        Ok(RowParser {
            year: require(year)?,
            state: require(state)?,
            sex: require(sex)?,
            age: find(&schema.age),
            investigation_date: find(&schema.investigation_date),
            death_date: find(&schema.death_date),
            doses: find(&schema.doses),
            summary: LoadSummary::default(),
            headers,
        })
    }

    fn parse_row(&mut self, cells: &[Option<&str>]) -> CaseRecord {
        let cell = |idx: usize| {
            cells
                .get(idx)
                .copied()
                .flatten()
                .map(str::trim)
                .filter(|s| !s.is_empty())
        };

        let mut fields = BTreeMap::new();
        for (idx, name) in self.headers.iter().enumerate() {
            if let Some(value) = cell(idx) {
                fields.insert(name.clone(), value.to_string());
            }
        }

        let age = match self.age.and_then(cell) {
            Some(raw) => {
                let age = parse_age(raw);
                if age.is_none() {
                    self.summary.invalid_ages += 1;
                }
                age
            }
            None => {
                if self.age.is_some() {
                    self.summary.invalid_ages += 1;
                }
                None
            }
        };

        let mut date_at = |idx: Option<usize>| -> Option<NaiveDate> {
            let raw = idx.and_then(cell)?;
            let date = parse_date(raw);
            if date.is_none() {
                self.summary.unparseable_dates += 1;
            }
            date
        };
        let investigation_date = date_at(self.investigation_date);
        let death_date = date_at(self.death_date);

        let doses = self.doses.and_then(cell).and_then(|raw| {
            let doses = parse_integer(raw);
            if doses.is_none() {
                self.summary.invalid_doses += 1;
            }
            doses
        });

        self.summary.rows += 1;
        CaseRecord {
            year: cell(self.year).map(normalize_year).unwrap_or_default(),
            state: cell(self.state).unwrap_or_default().to_string(),
            sex: cell(self.sex).unwrap_or_default().to_string(),
            age,
            investigation_date,
            death_date,
            doses,
            fields,
        }
    }

    fn finish(self, records: Vec<CaseRecord>) -> CaseTable {
        CaseTable::from_records(records, self.headers, self.summary)
    }
}

// ---------------------------------------------------------------------------
// Cell parsers
// ---------------------------------------------------------------------------

/// Year as text; a float rendering of an integer (`2019.0`) becomes `2019`.
pub fn normalize_year(raw: &str) -> String {
    let s = raw.trim();
    match s.strip_suffix(".0") {
        Some(int) if !int.is_empty() && int.bytes().all(|b| b.is_ascii_digit()) => int.to_string(),
        _ => s.to_string(),
    }
}

/// Whole non-negative years. Fractional ages (`34.7`) are rejected like any
/// other malformed cell; `34.0` is accepted.
pub fn parse_age(raw: &str) -> Option<u32> {
    parse_integer(raw).and_then(|v| u32::try_from(v).ok())
}

pub fn parse_integer(raw: &str) -> Option<i64> {
    let s = raw.trim();
    s.parse::<i64>().ok().or_else(|| {
        s.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .map(|v| v as i64)
    })
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y", "%Y%m%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
];

/// Permissive date parsing. Returns `None` for anything unrecognised.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "NU_ANO,SG_UF_NOT,CS_SEXO,IDADE,DT_INVEST,DT_OBITO,NU_DOSES,EVOLUCAO";

    #[test]
    fn parses_rows_and_tolerates_bad_cells() {
        let text = format!(
            "{HEADER}\n\
             2019,SP,Masculino,45,2019-03-02,,3,Cura\n\
             2019.0,RJ,Feminino,abc,02/04/2019,not a date,x,Óbito\n\
             2020,SP,Masculino,-3,,2020-01-15 00:00:00,,Óbito\n"
        );
        let table = parse_csv(&text, &ColumnSchema::default()).unwrap();

        assert_eq!(table.len(), 3);
        let r = &table.records;
        assert_eq!(r[0].year, "2019");
        assert_eq!(r[1].year, "2019");
        assert_eq!(r[0].age, Some(45));
        assert_eq!(r[1].age, None);
        assert_eq!(r[2].age, None);
        assert_eq!(r[1].investigation_date, NaiveDate::from_ymd_opt(2019, 4, 2));
        assert_eq!(r[1].death_date, None);
        assert_eq!(r[2].death_date, NaiveDate::from_ymd_opt(2020, 1, 15));
        assert_eq!(r[0].doses, Some(3));
        assert_eq!(r[1].field("EVOLUCAO"), Some("Óbito"));
        assert_eq!(r[0].field("DT_OBITO"), None);

        assert_eq!(table.summary.unparseable_dates, 1);
        assert_eq!(table.summary.invalid_ages, 2);
        assert_eq!(table.summary.invalid_doses, 1);
        assert_eq!(table.years.iter().collect::<Vec<_>>(), ["2019", "2020"]);
    }

    #[test]
    fn short_rows_are_padded_with_empty_cells() {
        let text = "NU_ANO,SG_UF_NOT,CS_SEXO,IDADE,DT_INVEST\n\
                    2019,SP,Masculino,30,2019-05-01\n\
                    2019,SP,Feminino\n";
        let table = parse_csv(text, &ColumnSchema::default()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[1].sex, "Feminino");
        assert_eq!(table.records[1].age, None);
        assert_eq!(table.records[1].investigation_date, None);
        assert_eq!(table.summary.invalid_ages, 1);
        assert_eq!(table.summary.unparseable_dates, 0);
    }

    #[test]
    fn fractional_age_counts_as_invalid() {
        let text = "NU_ANO,SG_UF_NOT,CS_SEXO,IDADE\n2019,SP,Masculino,34.7\n2019,SP,Masculino,34.0\n";
        let table = parse_csv(text, &ColumnSchema::default()).unwrap();
        assert_eq!(table.records[0].age, None);
        assert_eq!(table.records[1].age, Some(34));
        assert_eq!(table.summary.invalid_ages, 1);
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let err = parse_csv("NU_ANO,CS_SEXO\n2019,Masculino\n", &ColumnSchema::default()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(c) if c == "SG_UF_NOT"));
    }

    #[test]
    fn latin1_bytes_decode_to_accented_text() {
        // "Óbito" in ISO-8859-1
        let bytes = vec![0xD3, b'b', b'i', b't', b'o'];
        assert_eq!(decode(bytes.clone(), TextEncoding::Latin1).unwrap(), "Óbito");
        assert!(decode(bytes, TextEncoding::Utf8).is_err());
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = load_file(Path::new("cases.xlsx"), TextEncoding::Latin1, &ColumnSchema::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(e) if e == "xlsx"));
    }

    #[test]
    fn date_formats() {
        let d = NaiveDate::from_ymd_opt(2018, 7, 9);
        for raw in ["2018-07-09", "09/07/2018", "2018/07/09", "09-07-2018", "20180709", "2018-07-09T10:00:00"] {
            assert_eq!(parse_date(raw), d, "{raw}");
        }
        assert_eq!(parse_date("2018-13-40"), None);
        assert_eq!(parse_date("ontem"), None);
    }

    #[test]
    fn numeric_cells() {
        assert_eq!(parse_age("34.0"), Some(34));
        assert_eq!(parse_age("34.7"), None);
        assert_eq!(parse_age("-1"), None);
        assert_eq!(parse_age("NaN"), None);
        assert_eq!(parse_integer("2.0"), Some(2));
        assert_eq!(parse_integer("2.5"), None);
        assert_eq!(normalize_year(" 2021 "), "2021");
        assert_eq!(normalize_year("2021.5"), "2021.5");
    }
}
