use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading the case table, the configuration or the
/// geography layer. All of them are fatal to the operation that raised them.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid {encoding} text: {detail}", path.display())]
    Encoding {
        path: PathBuf,
        encoding: &'static str,
        detail: String,
    },

    #[error("parsing CSV")]
    Csv(#[from] csv::Error),

    #[error("reading parquet")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("converting arrow column")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("required column '{0}' is missing")]
    MissingColumn(String),

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid geography file: {0}")]
    Geo(String),

    #[error("fetching {url}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

pub type Result<T, E = LoadError> = std::result::Result<T, E>;
