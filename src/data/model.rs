use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};

use super::schema::ColumnSchema;

// ---------------------------------------------------------------------------
// YearMonth – month period derived from a date
// ---------------------------------------------------------------------------

/// A calendar month. Ordered chronologically, displayed as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// CaseRecord – one row of the dataset
// ---------------------------------------------------------------------------

/// One notified tetanus case.
#[derive(Debug, Clone, Default)]
pub struct CaseRecord {
    /// Notification year as text (`"2019"`).
    pub year: String,
    /// Reporting state (`"SP"`).
    pub state: String,
    /// Raw sex token as found in the file.
    pub sex: String,
    /// Age in years. `None` when missing, non-numeric or negative.
    pub age: Option<u32>,
    pub investigation_date: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
    /// Number of vaccine doses received.
    pub doses: Option<i64>,
    /// Every non-empty raw cell, keyed by column name.
    pub fields: BTreeMap<String, String>,
}

impl CaseRecord {
    /// Raw text of a column, `None` when the cell was empty or absent.
    pub fn field(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    pub fn investigation_month(&self) -> Option<YearMonth> {
        self.investigation_date.map(YearMonth::of)
    }

    pub fn death_month(&self) -> Option<YearMonth> {
        self.death_date.map(YearMonth::of)
    }
}

// ---------------------------------------------------------------------------
// CaseTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// Counters for data-quality issues tolerated during load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub rows: usize,
    pub unparseable_dates: usize,
    pub invalid_ages: usize,
    pub invalid_doses: usize,
}

/// The full parsed dataset with pre-computed filter options.
#[derive(Debug, Clone, Default)]
pub struct CaseTable {
    pub records: Vec<CaseRecord>,
    /// Column names in file order.
    pub column_names: Vec<String>,
    /// Distinct values of the three filter dimensions, sorted.
    pub years: BTreeSet<String>,
    pub states: BTreeSet<String>,
    pub sexes: BTreeSet<String>,
    pub summary: LoadSummary,
}

impl CaseTable {
    /// Build the distinct-value indices from the loaded records.
    pub fn from_records(
        records: Vec<CaseRecord>,
        column_names: Vec<String>,
        summary: LoadSummary,
    ) -> Self {
        let mut years = BTreeSet::new();
        let mut states = BTreeSet::new();
        let mut sexes = BTreeSet::new();
        for rec in &records {
            years.insert(rec.year.clone());
            states.insert(rec.state.clone());
            sexes.insert(rec.sex.clone());
        }
        CaseTable {
            records,
            column_names,
            years,
            states,
            sexes,
            summary,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Optional schema columns the file does not have.
    pub fn missing_columns<'s>(&self, schema: &'s ColumnSchema) -> Vec<&'s str> {
        schema
            .optional_columns()
            .filter(|name| !self.column_names.iter().any(|c| c.as_str() == *name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_month_orders_chronologically() {
        let a = YearMonth::new(2019, 12);
        let b = YearMonth::new(2020, 1);
        assert!(a < b);
        assert_eq!(a.to_string(), "2019-12");
        assert_eq!(serde_json::to_string(&b).unwrap(), "\"2020-01\"");
    }

    #[test]
    fn distinct_values_are_collected() {
        let rec = |year: &str, state: &str, sex: &str| CaseRecord {
            year: year.into(),
            state: state.into(),
            sex: sex.into(),
            ..Default::default()
        };
        let table = CaseTable::from_records(
            vec![rec("2019", "SP", "Masculino"), rec("2020", "SP", "Feminino")],
            Vec::new(),
            LoadSummary::default(),
        );
        assert_eq!(table.years.len(), 2);
        assert_eq!(table.states.len(), 1);
        assert_eq!(table.sexes.len(), 2);
    }

    #[test]
    fn reports_absent_optional_columns() {
        let schema = ColumnSchema::default();
        let mut columns: Vec<String> = ["NU_ANO", "SG_UF_NOT", "CS_SEXO"]
            .iter()
            .chain(schema.optional_columns().collect::<Vec<_>>().iter())
            .map(|c| c.to_string())
            .collect();
        let full = CaseTable::from_records(Vec::new(), columns.clone(), LoadSummary::default());
        assert!(full.missing_columns(&schema).is_empty());

        columns.retain(|c| c != "CS_RACA" && c != "TRISMO");
        let partial = CaseTable::from_records(Vec::new(), columns, LoadSummary::default());
        assert_eq!(partial.missing_columns(&schema), ["CS_RACA", "TRISMO"]);
    }
}
