use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::model::{CaseRecord, CaseTable};

// ---------------------------------------------------------------------------
// Filter predicate: which values are selected per dimension
// ---------------------------------------------------------------------------

/// The three filterable columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Year,
    State,
    Sex,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Year, Dimension::State, Dimension::Sex];

    /// Value of this dimension on a record.
    pub fn value_of(self, record: &CaseRecord) -> &str {
        match self {
            Dimension::Year => &record.year,
            Dimension::State => &record.state,
            Dimension::Sex => &record.sex,
        }
    }

    /// Every distinct value of this dimension in the table.
    pub fn options(self, table: &CaseTable) -> &BTreeSet<String> {
        match self {
            Dimension::Year => &table.years,
            Dimension::State => &table.states,
            Dimension::Sex => &table.sexes,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Dimension::Year => "Year",
            Dimension::State => "State",
            Dimension::Sex => "Sex",
        })
    }
}

/// Selected values per dimension.
///
/// An empty set selects nothing: the filtered view is then empty. It is never
/// read as "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub years: BTreeSet<String>,
    pub states: BTreeSet<String>,
    pub sexes: BTreeSet<String>,
}

impl FilterSelection {
    /// All distinct values selected (i.e., show everything).
    pub fn all(table: &CaseTable) -> Self {
        Self {
            years: table.years.clone(),
            states: table.states.clone(),
            sexes: table.sexes.clone(),
        }
    }

    pub fn get(&self, dim: Dimension) -> &BTreeSet<String> {
        match dim {
            Dimension::Year => &self.years,
            Dimension::State => &self.states,
            Dimension::Sex => &self.sexes,
        }
    }

    pub fn get_mut(&mut self, dim: Dimension) -> &mut BTreeSet<String> {
        match dim {
            Dimension::Year => &mut self.years,
            Dimension::State => &mut self.states,
            Dimension::Sex => &mut self.sexes,
        }
    }

    /// Toggle a single value in a dimension.
    pub fn toggle(&mut self, dim: Dimension, value: &str) {
        let selected = self.get_mut(dim);
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
    }

    pub fn select_all(&mut self, dim: Dimension, table: &CaseTable) {
        *self.get_mut(dim) = dim.options(table).clone();
    }

    pub fn select_none(&mut self, dim: Dimension) {
        self.get_mut(dim).clear();
    }

    /// Whether a record passes all three membership tests.
    pub fn matches(&self, record: &CaseRecord) -> bool {
        Dimension::ALL
            .iter()
            .all(|&dim| self.get(dim).contains(dim.value_of(record)))
    }
}

/// Return indices of records that pass all three filters.
pub fn filtered_indices(table: &CaseTable, selection: &FilterSelection) -> Vec<usize> {
    if Dimension::ALL.iter().any(|&dim| selection.get(dim).is_empty()) {
        // Nothing selected for some dimension → hide everything
        return Vec::new();
    }
    table
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| selection.matches(rec))
        .map(|(i, _)| i)
        .collect()
}

// ---------------------------------------------------------------------------
// FilteredView – borrowed subset fed to the aggregators
// ---------------------------------------------------------------------------

/// A transient view over the rows of a table that passed the filters.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    table: &'a CaseTable,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    pub fn new(table: &'a CaseTable, selection: &FilterSelection) -> Self {
        Self::from_indices(table, filtered_indices(table, selection))
    }

    pub fn from_indices(table: &'a CaseTable, indices: Vec<usize>) -> Self {
        Self { table, indices }
    }

    /// The unfiltered view of a table.
    pub fn full(table: &'a CaseTable) -> Self {
        Self::from_indices(table, (0..table.len()).collect())
    }

    pub fn records(&self) -> impl Iterator<Item = &'a CaseRecord> + '_ {
        self.indices.iter().map(|&i| &self.table.records[i])
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
