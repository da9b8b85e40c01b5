//! Filtering and aggregation of confirmed tetanus case records.
//!
//! The dashboard binary and the `tetanus-report` CLI are thin shells around
//! [`data::report::build_report`], a pure function from a loaded
//! [`data::model::CaseTable`] and a [`data::filter::FilterSelection`] to every
//! aggregate the dashboard shows.

pub mod config;
pub mod data;
pub mod error;
pub mod geo;
