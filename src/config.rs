use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::schema::ColumnSchema;
use crate::error::{LoadError, Result};

/// Text encoding of CSV input. Parquet input is always UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    #[default]
    #[serde(alias = "iso-8859-1", alias = "latin-1")]
    Latin1,
    #[serde(alias = "utf-8")]
    Utf8,
}

impl TextEncoding {
    pub fn name(self) -> &'static str {
        match self {
            TextEncoding::Latin1 => "ISO-8859-1",
            TextEncoding::Utf8 => "UTF-8",
        }
    }
}

/// Public GeoJSON of the Brazilian states, keyed by the `sigla` property.
pub const DEFAULT_GEO_URL: &str =
    "https://raw.githubusercontent.com/codeforamerica/click_that_hood/master/public/data/brazil-states.geojson";

/// Where the choropleth geometry comes from and how features are keyed.
///
/// A local `path` takes precedence over `url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    pub path: Option<PathBuf>,
    pub url: Option<String>,
    /// Feature property holding the state code (matched against the state column).
    pub key_property: String,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            path: None,
            url: Some(DEFAULT_GEO_URL.to_string()),
            key_property: "sigla".to_string(),
        }
    }
}

/// Top-level configuration shared by the dashboard and the report CLI.
///
/// ```json
/// {
///   "data_path": "tettot.csv",
///   "encoding": "latin1",
///   "schema": { "sex": "CS_SEXO", "death_token": "Óbito" },
///   "geo": { "path": "brazil-states.geojson" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub data_path: PathBuf,
    pub encoding: TextEncoding,
    pub schema: ColumnSchema,
    pub geo: Option<GeoConfig>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("tettot.csv"),
            encoding: TextEncoding::default(),
            schema: ColumnSchema::default(),
            geo: Some(GeoConfig::default()),
        }
    }
}

impl DashboardConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Resolve the effective config from optional `--config` / `--data` flags.
    pub fn resolve(config: Option<&Path>, data: Option<&Path>) -> Result<Self> {
        let mut cfg = match config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        if let Some(data) = data {
            cfg.data_path = data.to_path_buf();
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let cfg = DashboardConfig::from_json("{}").unwrap();
        assert_eq!(cfg, DashboardConfig::default());
        assert_eq!(cfg.encoding, TextEncoding::Latin1);
        assert_eq!(cfg.schema.year, "NU_ANO");
    }

    #[test]
    fn partial_schema_override_keeps_other_defaults() {
        let cfg = DashboardConfig::from_json(
            r#"{ "encoding": "utf-8", "schema": { "male_token": "M", "female_token": "F" },
                 "geo": { "path": "br.geojson" } }"#,
        )
        .unwrap();
        assert_eq!(cfg.encoding, TextEncoding::Utf8);
        assert_eq!(cfg.schema.male_token, "M");
        assert_eq!(cfg.schema.state, "SG_UF_NOT");
        let geo = cfg.geo.unwrap();
        assert_eq!(geo.path.as_deref(), Some(Path::new("br.geojson")));
        assert_eq!(geo.key_property, "sigla");
    }

    #[test]
    fn map_defaults_to_remote_states_geojson() {
        let geo = DashboardConfig::default().geo.unwrap();
        assert_eq!(geo.path, None);
        assert_eq!(geo.url.as_deref(), Some(DEFAULT_GEO_URL));

        let cfg = DashboardConfig::from_json(r#"{ "geo": null }"#).unwrap();
        assert_eq!(cfg.geo, None);
    }

    #[test]
    fn data_flag_overrides_config() {
        let cfg = DashboardConfig::resolve(None, Some(Path::new("other.csv"))).unwrap();
        assert_eq!(cfg.data_path, PathBuf::from("other.csv"));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = DashboardConfig::from_json("{ nope").unwrap_err();
        assert!(matches!(err, LoadError::Config(_)));
    }
}
