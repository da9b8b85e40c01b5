use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate};
use clap::Parser;
use encoding::all::ISO_8859_1;
use encoding::{EncoderTrap, Encoding};
use parquet::arrow::ArrowWriter;

/// Write a synthetic tetanus case dataset for demos and manual testing.
#[derive(Parser)]
#[command(name = "generate_sample")]
struct Args {
    /// Output file; `.csv` is written as ISO-8859-1, `.parquet` as Arrow columns
    #[arg(short, long, default_value = "tettot.csv")]
    output: PathBuf,

    #[arg(short, long, default_value_t = 2000)]
    rows: usize,

    #[arg(short, long, default_value_t = 42)]
    seed: u64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Pick from `(value, weight)` pairs.
    fn weighted<'a>(&mut self, choices: &[(&'a str, f64)]) -> &'a str {
        let total: f64 = choices.iter().map(|(_, w)| w).sum();
        let mut r = self.next_f64() * total;
        for &(value, weight) in choices {
            if r < weight {
                return value;
            }
            r -= weight;
        }
        choices[choices.len() - 1].0
    }
}

const HEADERS: [&str; 19] = [
    "NU_ANO", "SG_UF_NOT", "CS_SEXO", "IDADE", "DT_INVEST", "DT_OBITO", "CS_ESCOL_N", "CS_RACA",
    "LOC_INFEC", "NU_DOSES", "TP_PROFILA", "TRISMO", "RISO", "OPISTOTONO", "RIG_NUCA",
    "RIG_ABDOM", "RIG_MEMBRO", "CRISES", "EVOLUCAO",
];

const STATES: &[(&str, f64)] = &[
    ("SP", 14.0), ("MG", 12.0), ("BA", 10.0), ("PA", 9.0), ("PE", 7.0), ("RS", 6.0),
    ("PR", 6.0), ("MA", 6.0), ("CE", 5.0), ("GO", 4.0), ("RJ", 4.0), ("SC", 3.0),
    ("PI", 3.0), ("AM", 3.0), ("PB", 2.0), ("MT", 2.0), ("RN", 2.0), ("TO", 2.0),
    ("AL", 2.0), ("MS", 2.0), ("RO", 1.0), ("ES", 1.0), ("SE", 1.0), ("AC", 1.0),
    ("AP", 0.5), ("RR", 0.5), ("DF", 0.5),
];

const SYMPTOM_RATES: [f64; 7] = [0.92, 0.45, 0.38, 0.80, 0.70, 0.75, 0.55];

/// One synthetic case as text cells in `HEADERS` order, plus typed year/age.
struct Row {
    year: i64,
    age: i64,
    cells: Vec<String>,
}

fn generate_row(rng: &mut SimpleRng) -> Result<Row> {
    let year = 2019 + (rng.next_u64() % 5) as i32;
    let day = 1 + (rng.next_u64() % 365) as u32;
    let invest = NaiveDate::from_yo_opt(year, day)
        .ok_or_else(|| anyhow!("invalid ordinal day {day} of {year}"))?;

    let sex = rng.weighted(&[("Masculino", 85.0), ("Feminino", 14.0), ("Ignorado", 1.0)]);
    let age = rng.gauss(52.0, 17.0).clamp(1.0, 95.0) as i64;

    let outcome = rng.weighted(&[("Óbito", 30.0), ("Cura", 65.0), ("Ignorado", 5.0)]);
    let death = if outcome == "Óbito" {
        (invest + Duration::days((rng.next_u64() % 21) as i64)).to_string()
    } else {
        String::new()
    };
    // a few malformed dates, tolerated by the loader
    let invest = if rng.chance(0.02) {
        "99/99/9999".to_string()
    } else {
        invest.to_string()
    };

    let doses = if rng.chance(0.15) {
        String::new()
    } else {
        rng.weighted(&[("0", 45.0), ("1", 20.0), ("2", 12.0), ("3", 23.0)]).to_string()
    };

    let mut cells = vec![
        year.to_string(),
        rng.weighted(STATES).to_string(),
        sex.to_string(),
        age.to_string(),
        invest,
        death,
        rng.weighted(&[
            ("Analfabeto", 12.0),
            ("Fundamental incompleto", 40.0),
            ("Fundamental completo", 12.0),
            ("Médio", 14.0),
            ("Superior", 4.0),
            ("Ignorado", 18.0),
        ])
        .to_string(),
        rng.weighted(&[
            ("Parda", 50.0),
            ("Branca", 33.0),
            ("Preta", 10.0),
            ("Indígena", 2.0),
            ("Amarela", 1.0),
            ("Ignorado", 4.0),
        ])
        .to_string(),
        rng.weighted(&[
            ("Zona rural", 35.0),
            ("Domicílio", 30.0),
            ("Trabalho", 20.0),
            ("Via pública", 10.0),
            ("Ignorado", 5.0),
        ])
        .to_string(),
        doses,
        rng.weighted(&[
            ("Nenhuma", 55.0),
            ("Vacina", 20.0),
            ("Soro", 10.0),
            ("Imunoglobulina", 5.0),
            ("Vacina + soro", 10.0),
        ])
        .to_string(),
    ];
    for rate in SYMPTOM_RATES {
        cells.push(if rng.chance(rate) { "Sim" } else { "Não" }.to_string());
    }
    cells.push(outcome.to_string());

    Ok(Row {
        year: i64::from(year),
        age,
        cells,
    })
}

fn write_csv(path: &Path, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADERS)?;
    for row in rows {
        writer.write_record(&row.cells)?;
    }
    let text = String::from_utf8(writer.into_inner().map_err(|e| anyhow!("{e}"))?)?;
    let bytes = ISO_8859_1
        .encode(&text, EncoderTrap::Strict)
        .map_err(|e| anyhow!("text not representable in ISO-8859-1: {e}"))?;
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
}

fn write_parquet(path: &Path, rows: &[Row]) -> Result<()> {
    let fields: Vec<Field> = HEADERS
        .iter()
        .map(|&name| match name {
            "NU_ANO" | "IDADE" => Field::new(name, DataType::Int64, false),
            _ => Field::new(name, DataType::Utf8, true),
        })
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let columns: Vec<ArrayRef> = HEADERS
        .iter()
        .enumerate()
        .map(|(col, &name)| -> ArrayRef {
            match name {
                "NU_ANO" => Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.year))),
                "IDADE" => Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.age))),
                _ => Arc::new(StringArray::from_iter(rows.iter().map(|r| {
                    let cell = &r.cells[col];
                    (!cell.is_empty()).then_some(cell.as_str())
                }))),
            }
        })
        .collect();

    let batch = RecordBatch::try_new(schema.clone(), columns)?;
    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);

    let rows = (0..args.rows)
        .map(|_| generate_row(&mut rng))
        .collect::<Result<Vec<_>>>()?;

    let ext = args
        .output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "csv" => write_csv(&args.output, &rows)?,
        "parquet" | "pq" => write_parquet(&args.output, &rows)?,
        other => bail!("Unsupported output extension: .{other}"),
    }

    println!("Wrote {} case records to {}", rows.len(), args.output.display());
    Ok(())
}
