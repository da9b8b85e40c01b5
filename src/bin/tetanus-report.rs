use std::collections::BTreeSet;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tetanus_dash::config::DashboardConfig;
use tetanus_dash::data::filter::{Dimension, FilterSelection};
use tetanus_dash::data::loader::load_file;
use tetanus_dash::data::model::CaseTable;
use tetanus_dash::data::report::build_report;

/// Print the dashboard aggregates for one filter selection as JSON.
#[derive(Parser)]
#[command(name = "tetanus-report")]
#[command(about = "Compute tetanus dashboard aggregates for a filter selection", long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Case records (.csv or .parquet); overrides `data_path` from the config
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Keep only these notification years (repeatable; default: all)
    #[arg(long = "year", value_name = "YEAR")]
    years: Vec<String>,

    /// Keep only these states (repeatable; default: all)
    #[arg(long = "state", value_name = "UF")]
    states: Vec<String>,

    /// Keep only these raw sex values (repeatable; default: all)
    #[arg(long = "sex", value_name = "SEX")]
    sexes: Vec<String>,

    /// Select no year at all (empty result)
    #[arg(long, conflicts_with = "years")]
    no_year: bool,

    /// Select no state at all (empty result)
    #[arg(long, conflicts_with = "states")]
    no_state: bool,

    /// Select no sex at all (empty result)
    #[arg(long, conflicts_with = "sexes")]
    no_sex: bool,

    /// Single-line JSON instead of pretty-printed
    #[arg(long, default_value_t = false)]
    compact: bool,
}

impl Args {
    fn requested(&self, dim: Dimension) -> (&[String], bool) {
        match dim {
            Dimension::Year => (&self.years, self.no_year),
            Dimension::State => (&self.states, self.no_state),
            Dimension::Sex => (&self.sexes, self.no_sex),
        }
    }
}

/// Start from every value, then narrow each dimension named on the command
/// line. Values absent from the data are kept (they match nothing) and warned about.
fn selection_from_args(args: &Args, table: &CaseTable) -> FilterSelection {
    let mut selection = FilterSelection::all(table);
    for dim in Dimension::ALL {
        match args.requested(dim) {
            (_, true) => selection.select_none(dim),
            ([], false) => {}
            (values, false) => {
                let unknown: Vec<&String> =
                    values.iter().filter(|v| !dim.options(table).contains(*v)).collect();
                if !unknown.is_empty() {
                    log::warn!("{dim} values not present in the data: {unknown:?}");
                }
                *selection.get_mut(dim) = values.iter().cloned().collect::<BTreeSet<_>>();
            }
        }
    }
    selection
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = DashboardConfig::resolve(args.config.as_deref(), args.data.as_deref())
        .context("reading configuration")?;
    let table = load_file(&config.data_path, config.encoding, &config.schema)
        .with_context(|| format!("loading {}", config.data_path.display()))?;

    let selection = selection_from_args(&args, &table);

    let report = build_report(&table, &selection, &config.schema);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if args.compact {
        serde_json::to_writer(&mut out, &report)?;
    } else {
        serde_json::to_writer_pretty(&mut out, &report)?;
    }
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tetanus_dash::data::model::{CaseRecord, LoadSummary};

    fn table() -> CaseTable {
        let records = [("2019", "SP", "Masculino"), ("2020", "RJ", "Feminino")]
            .iter()
            .map(|&(year, state, sex)| CaseRecord {
                year: year.into(),
                state: state.into(),
                sex: sex.into(),
                ..Default::default()
            })
            .collect();
        CaseTable::from_records(records, Vec::new(), LoadSummary::default())
    }

    fn args(flags: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("tetanus-report").chain(flags.iter().copied())).unwrap()
    }

    #[test]
    fn no_flags_keep_every_value() {
        let t = table();
        assert_eq!(selection_from_args(&args(&[]), &t), FilterSelection::all(&t));
    }

    #[test]
    fn repeated_flags_narrow_one_dimension() {
        let t = table();
        let sel = selection_from_args(&args(&["--state", "SP", "--state", "RJ", "--year", "2020"]), &t);
        assert_eq!(sel.years.iter().collect::<Vec<_>>(), ["2020"]);
        assert_eq!(sel.states, t.states);
        assert_eq!(sel.sexes, t.sexes);
    }

    #[test]
    fn no_dimension_flag_selects_nothing() {
        let t = table();
        let sel = selection_from_args(&args(&["--no-sex"]), &t);
        assert!(sel.sexes.is_empty());
        assert_eq!(build_report(&t, &sel, &Default::default()).filtered_records, 0);
    }

    #[test]
    fn unknown_values_are_kept_but_match_nothing() {
        let t = table();
        let sel = selection_from_args(&args(&["--state", "XX"]), &t);
        assert_eq!(sel.states.iter().collect::<Vec<_>>(), ["XX"]);
        assert_eq!(build_report(&t, &sel, &Default::default()).filtered_records, 0);
    }

    #[test]
    fn no_flag_conflicts_with_values() {
        let parsed = Args::try_parse_from(["tetanus-report", "--no-year", "--year", "2019"]);
        assert!(parsed.is_err());
    }
}
