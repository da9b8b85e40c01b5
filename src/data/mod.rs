//! Data layer: core types, loading, filtering and aggregation.
//!
//! Architecture:
//! ```text
//!  .csv (Latin-1) / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → CaseTable   (memoized by cache)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  year ∧ state ∧ sex membership → FilteredView
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ aggregate  │  pyramid, monthly, value counts, doses, symptoms, lethality
//!   └───────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  report   │  (table, selection) → DashboardReport
//!   └──────────┘
//! ```

pub mod aggregate;
pub mod cache;
pub mod filter;
pub mod loader;
pub mod model;
pub mod report;
pub mod schema;
