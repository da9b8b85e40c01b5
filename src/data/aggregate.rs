//! Stateless aggregations over a [`FilteredView`]. Each one is recomputed
//! from scratch whenever the view changes.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::filter::FilteredView;
use super::model::{CaseRecord, YearMonth};
use super::schema::ColumnSchema;

// ---------------------------------------------------------------------------
// Age pyramid
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PyramidColumn {
    /// Display label (`Homens`, `Mulheres`, or the raw value for other sexes).
    pub label: String,
    /// Raw sex token this column counts.
    pub sex: String,
    /// One count per entry of [`AgePyramid::ages`]; negated for the male column.
    pub counts: Vec<i64>,
}

/// Counts per (age, sex) with sex pivoted into columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgePyramid {
    /// Distinct ages, ascending.
    pub ages: Vec<u32>,
    /// Male column first, then female, then any other sex value in order.
    pub columns: Vec<PyramidColumn>,
}

impl AgePyramid {
    pub fn column(&self, label: &str) -> Option<&PyramidColumn> {
        self.columns.iter().find(|c| c.label == label)
    }

    /// Sum of absolute values across every column.
    pub fn total_abs(&self) -> u64 {
        self.columns
            .iter()
            .flat_map(|c| c.counts.iter())
            .map(|v| v.unsigned_abs())
            .sum()
    }
}

/// Group by (age, sex), pivot sex into columns and negate the male counts so
/// they render left of the midline. Rows without an age or a sex are not
/// counted.
pub fn age_pyramid(view: &FilteredView<'_>, schema: &ColumnSchema) -> AgePyramid {
    let mut cells: BTreeMap<(u32, &str), i64> = BTreeMap::new();
    for rec in view.records().filter(|rec| !rec.sex.is_empty()) {
        if let Some(age) = rec.age {
            *cells.entry((age, rec.sex.as_str())).or_default() += 1;
        }
    }

    let mut ages: Vec<u32> = cells.keys().map(|&(age, _)| age).collect();
    ages.dedup();

    let mut sexes: Vec<&str> = cells.keys().map(|&(_, sex)| sex).collect();
    sexes.sort_by_key(|&sex| {
        let rank = if sex == schema.male_token {
            0
        } else if sex == schema.female_token {
            1
        } else {
            2
        };
        (rank, sex)
    });
    sexes.dedup();

    let columns = sexes
        .into_iter()
        .map(|sex| {
            let sign = if sex == schema.male_token { -1 } else { 1 };
            let counts = ages
                .iter()
                .map(|&age| sign * cells.get(&(age, sex)).copied().unwrap_or(0))
                .collect();
            PyramidColumn {
                label: schema.sex_label(sex).to_string(),
                sex: sex.to_string(),
                counts,
            }
        })
        .collect();

    AgePyramid { ages, columns }
}

// ---------------------------------------------------------------------------
// Monthly series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyPoint {
    pub month: YearMonth,
    /// Cases by investigation month.
    pub cases: usize,
    /// Deaths by month of death.
    pub deaths: usize,
}

/// Cases per investigation month and deaths per month of death, outer-joined
/// on month with zero for absent buckets. Ascending by month.
pub fn monthly_series(view: &FilteredView<'_>) -> Vec<MonthlyPoint> {
    let mut merged: BTreeMap<YearMonth, (usize, usize)> = BTreeMap::new();
    for rec in view.records() {
        if let Some(month) = rec.investigation_month() {
            merged.entry(month).or_default().0 += 1;
        }
        if let Some(month) = rec.death_month() {
            merged.entry(month).or_default().1 += 1;
        }
    }
    merged
        .into_iter()
        .map(|(month, (cases, deaths))| MonthlyPoint {
            month,
            cases,
            deaths,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Value counts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub value: String,
    pub count: usize,
}

/// Count occurrences per distinct value of a column. Empty cells are skipped.
/// Ordered by count descending, then value ascending.
pub fn categorical_counts(view: &FilteredView<'_>, column: &str) -> Vec<CategoryCount> {
    value_counts(view.records().filter_map(|rec| rec.field(column)))
}

/// Value counts of the reporting state, input of the choropleth.
pub fn state_counts(view: &FilteredView<'_>) -> Vec<CategoryCount> {
    value_counts(
        view.records()
            .map(|rec| rec.state.as_str())
            .filter(|s| !s.is_empty()),
    )
}

fn value_counts<'a>(values: impl Iterator<Item = &'a str>) -> Vec<CategoryCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }
    let mut out: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(value, count)| CategoryCount {
            value: value.to_string(),
            count,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    out
}

// ---------------------------------------------------------------------------
// Dose histogram
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DoseCount {
    pub doses: i64,
    pub count: usize,
}

/// Occurrences per distinct dose number, ascending by dose number.
pub fn dose_histogram(view: &FilteredView<'_>) -> Vec<DoseCount> {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for doses in view.records().filter_map(|rec| rec.doses) {
        *counts.entry(doses).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(doses, count)| DoseCount { doses, count })
        .collect()
}

// ---------------------------------------------------------------------------
// Symptom frequency
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymptomCount {
    pub label: String,
    pub column: String,
    pub count: usize,
}

/// For each configured symptom flag, the number of rows equal to the
/// affirmative token. Keeps the configured order.
pub fn symptom_frequency(view: &FilteredView<'_>, schema: &ColumnSchema) -> Vec<SymptomCount> {
    schema
        .symptoms
        .iter()
        .map(|symptom| SymptomCount {
            label: symptom.label.clone(),
            column: symptom.column.clone(),
            count: view
                .records()
                .filter(|rec| rec.field(&symptom.column) == Some(schema.affirmative_token.as_str()))
                .count(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Lethality
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearLethality {
    pub year: String,
    pub deaths: usize,
    pub total: usize,
    /// Percentage of the year's rows whose outcome is the death token.
    pub rate: f64,
}

fn is_death(rec: &CaseRecord, schema: &ColumnSchema) -> bool {
    rec.field(&schema.outcome) == Some(schema.death_token.as_str())
}

/// Lethality rate per notification year, ascending by year.
pub fn lethality_by_year(view: &FilteredView<'_>, schema: &ColumnSchema) -> Vec<YearLethality> {
    let mut groups: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for rec in view.records() {
        let (deaths, total) = groups.entry(rec.year.as_str()).or_default();
        *total += 1;
        if is_death(rec, schema) {
            *deaths += 1;
        }
    }
    groups
        .into_iter()
        .map(|(year, (deaths, total))| YearLethality {
            year: year.to_string(),
            deaths,
            total,
            rate: 100.0 * deaths as f64 / total as f64,
        })
        .collect()
}
