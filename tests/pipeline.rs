use std::sync::Arc;

use arrow::array::{ArrayRef, Date32Array, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use encoding::all::ISO_8859_1;
use encoding::{EncoderTrap, Encoding};
use parquet::arrow::ArrowWriter;
use tempfile::TempDir;
use tetanus_dash::config::{DashboardConfig, TextEncoding};
use tetanus_dash::data::filter::{filtered_indices, Dimension, FilterSelection};
use tetanus_dash::data::loader::load_file;
use tetanus_dash::data::report::build_report;
use tetanus_dash::data::schema::ColumnSchema;
use tetanus_dash::error::LoadError;

const CSV: &str = "\
NU_ANO,SG_UF_NOT,CS_SEXO,IDADE,DT_INVEST,DT_OBITO,CS_ESCOL_N,CS_RACA,LOC_INFEC,NU_DOSES,TP_PROFILA,TRISMO,RISO,OPISTOTONO,RIG_NUCA,RIG_ABDOM,RIG_MEMBRO,CRISES,EVOLUCAO
2019,SP,Masculino,45,2019-01-10,2019-01-20,Médio,Parda,Zona rural,0,Nenhuma,Sim,Não,Não,Sim,Sim,Não,Não,Óbito
2019,SP,Feminino,62,2019-01-28,,Analfabeto,Branca,Domicílio,3,Vacina,Sim,Sim,Não,Não,Não,Não,Não,Cura
2019,BA,Masculino,45,2019-02-03,,Médio,Parda,Trabalho,1,Soro,Não,Não,Não,Não,Não,Não,Não,Cura
2020,BA,Masculino,30,31/12/2019,2020-02-11,Médio,Preta,Zona rural,0,Nenhuma,Sim,Sim,Sim,Sim,Sim,Sim,Sim,Óbito
2020,MG,Masculino,,2020-03-05,,Superior,Parda,Via pública,,Nenhuma,Sim,Não,Não,Não,Não,Não,Não,Cura
2021,MG,Feminino,71,sem data,2021-06-30,Médio,Branca,Domicílio,2,Vacina,Sim,Não,Sim,Não,Não,Não,Sim,Óbito
";

fn write_latin1(dir: &TempDir, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let bytes = ISO_8859_1.encode(text, EncoderTrap::Strict).unwrap();
    std::fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn latin1_csv_end_to_end() {
    let dir = TempDir::new().unwrap();
    let path = write_latin1(&dir, "tettot.csv", CSV);
    let config = DashboardConfig::resolve(None, Some(path.as_path())).unwrap();
    let table = load_file(&config.data_path, config.encoding, &config.schema).unwrap();

    assert_eq!(table.len(), 6);
    assert_eq!(table.summary.unparseable_dates, 1);
    assert_eq!(table.summary.invalid_ages, 1);
    assert_eq!(table.records[0].field("EVOLUCAO"), Some("Óbito"));

    let schema = &config.schema;
    let report = build_report(&table, &FilterSelection::all(&table), schema);
    assert_eq!(report.filtered_records, 6);

    // pyramid: men left, all rows with an age accounted for
    let men = report.age_pyramid.column("Homens").unwrap();
    assert!(men.counts.iter().all(|&v| v <= 0));
    assert_eq!(report.age_pyramid.total_abs(), 5);
    assert_eq!(report.age_pyramid.ages, vec![30, 45, 62, 71]);

    // monthly: union of both month sets, zero-filled
    let months: Vec<String> = report.monthly.iter().map(|p| p.month.to_string()).collect();
    assert_eq!(
        months,
        ["2019-01", "2019-02", "2019-12", "2020-02", "2020-03", "2021-06"]
    );
    let jan = &report.monthly[0];
    assert_eq!((jan.cases, jan.deaths), (2, 1));
    let jun = report.monthly.last().unwrap();
    assert_eq!((jun.cases, jun.deaths), (0, 1));

    assert_eq!(report.education[0].value, "Médio");
    assert_eq!(report.education[0].count, 4);
    assert_eq!(report.doses.iter().map(|d| d.doses).collect::<Vec<_>>(), [0, 1, 2, 3]);
    assert_eq!(report.symptoms[0].count, 5);

    let rates: Vec<f64> = report.lethality.iter().map(|l| l.rate).collect();
    assert_eq!(report.lethality.len(), 3);
    assert!((rates[0] - 100.0 / 3.0).abs() < 1e-9);
    assert!((rates[1] - 50.0).abs() < 1e-9);
    assert!((rates[2] - 100.0).abs() < 1e-9);
}

#[test]
fn filtered_view_is_subset_matching_conjunction() {
    let dir = TempDir::new().unwrap();
    let path = write_latin1(&dir, "tettot.csv", CSV);
    let schema = ColumnSchema::default();
    let table = load_file(&path, TextEncoding::Latin1, &schema).unwrap();

    let mut selection = FilterSelection::all(&table);
    selection.toggle(Dimension::Year, "2021");
    selection.toggle(Dimension::State, "BA");

    let idx = filtered_indices(&table, &selection);
    assert_eq!(idx, vec![0, 1, 4]);
    for i in idx {
        assert!(selection.matches(&table.records[i]));
    }

    let report = build_report(&table, &selection, &schema);
    assert_eq!(report.filtered_records, 3);
    assert_eq!(report.states.len(), 2);

    for dim in Dimension::ALL {
        let mut empty = selection.clone();
        empty.select_none(dim);
        assert_eq!(build_report(&table, &empty, &schema).filtered_records, 0);
    }
}

#[test]
fn latin1_file_read_as_utf8_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = write_latin1(&dir, "tettot.csv", CSV);
    let err = load_file(&path, TextEncoding::Utf8, &ColumnSchema::default()).unwrap_err();
    assert!(matches!(err, LoadError::Encoding { .. }));
}

#[test]
fn missing_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    let err = load_file(
        &dir.path().join("nope.csv"),
        TextEncoding::Latin1,
        &ColumnSchema::default(),
    )
    .unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
}

#[test]
fn parquet_columns_are_cast_to_text() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tettot.parquet");

    let schema = Arc::new(Schema::new(vec![
        Field::new("NU_ANO", DataType::Float64, true),
        Field::new("SG_UF_NOT", DataType::Utf8, true),
        Field::new("CS_SEXO", DataType::Utf8, true),
        Field::new("IDADE", DataType::Float64, true),
        Field::new("DT_INVEST", DataType::Date32, true),
        Field::new("EVOLUCAO", DataType::Utf8, true),
    ]));
    // 2019-03-01 and 2020-07-15 as days since the epoch
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Float64Array::from(vec![2019.0, 2020.0])),
        Arc::new(StringArray::from(vec!["SP", "RJ"])),
        Arc::new(StringArray::from(vec![Some("Masculino"), None])),
        Arc::new(Float64Array::from(vec![Some(40.0), None])),
        Arc::new(Date32Array::from(vec![Some(17956), Some(18458)])),
        Arc::new(StringArray::from(vec!["Óbito", "Cura"])),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let table = load_file(&path, TextEncoding::Latin1, &ColumnSchema::default()).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.years.iter().collect::<Vec<_>>(), ["2019", "2020"]);
    assert_eq!(table.records[0].age, Some(40));
    assert_eq!(table.records[1].sex, "");
    assert_eq!(
        table.records[1].investigation_month().map(|m| m.to_string()).as_deref(),
        Some("2020-07")
    );

    let report = build_report(&table, &FilterSelection::all(&table), &ColumnSchema::default());
    assert_eq!(report.lethality[0].rate, 100.0);
}
