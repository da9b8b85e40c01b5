use std::path::Path;
use std::time::Duration;

use serde_json::Value as JsonValue;

use crate::config::GeoConfig;
use crate::data::aggregate::CategoryCount;
use crate::error::{LoadError, Result};

/// Closed ring of `[lon, lat]` points.
pub type Ring = Vec<[f64; 2]>;

pub type Triangle = [[f64; 2]; 3];

/// One map feature (a state), possibly made of several polygons.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Value of the key property, matched against the state column.
    pub key: String,
    pub name: Option<String>,
    /// Each polygon is its exterior ring followed by any holes.
    pub polygons: Vec<Vec<Ring>>,
    /// Fill triangles of every exterior ring. Holes are not cut out.
    pub triangles: Vec<Triangle>,
}

impl Region {
    /// Feature name when the file has one, otherwise the key.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.key)
    }
}

/// Geometry used by the choropleth.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoLayer {
    pub regions: Vec<Region>,
}

const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

impl GeoLayer {
    /// Load from the configured local file, or fetch the configured URL.
    pub fn from_config(config: &GeoConfig) -> Result<Self> {
        match (&config.path, &config.url) {
            (Some(path), _) => Self::from_file(path, &config.key_property),
            (None, Some(url)) => Self::from_url(url, &config.key_property),
            (None, None) => Err(LoadError::Geo("neither 'path' nor 'url' is set".into())),
        }
    }

    /// Download a GeoJSON document with a blocking GET.
    pub fn from_url(url: &str, key_property: &str) -> Result<Self> {
        let fetch = |source| LoadError::Fetch {
            url: url.to_string(),
            source,
        };
        let client = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(fetch)?;
        let text = client
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.text())
            .map_err(fetch)?;
        let layer = Self::from_geojson(&text, key_property)?;
        log::info!("Fetched {} map regions from {url}", layer.regions.len());
        Ok(layer)
    }

    pub fn from_file(path: &Path, key_property: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let layer = Self::from_geojson(&text, key_property)?;
        log::info!("Loaded {} map regions from {}", layer.regions.len(), path.display());
        Ok(layer)
    }

    /// Parse a GeoJSON `FeatureCollection` of Polygon / MultiPolygon features.
    pub fn from_geojson(text: &str, key_property: &str) -> Result<Self> {
        let root: JsonValue =
            serde_json::from_str(text).map_err(|e| LoadError::Geo(e.to_string()))?;
        if root.get("type").and_then(JsonValue::as_str) != Some("FeatureCollection") {
            return Err(LoadError::Geo("expected a FeatureCollection".into()));
        }
        let features = root
            .get("features")
            .and_then(JsonValue::as_array)
            .ok_or_else(|| LoadError::Geo("missing 'features' array".into()))?;

        let mut regions = Vec::with_capacity(features.len());
        for (i, feature) in features.iter().enumerate() {
            let props = feature.get("properties");
            let Some(key) = props.and_then(|p| p.get(key_property)).and_then(property_text) else {
                log::warn!("Feature {i} has no '{key_property}' property, skipped");
                continue;
            };
            let name = props.and_then(|p| p.get("name")).and_then(property_text);

            let geometry = feature.get("geometry").unwrap_or(&JsonValue::Null);
            let coords = geometry.get("coordinates").unwrap_or(&JsonValue::Null);
            let polygons = match geometry.get("type").and_then(JsonValue::as_str) {
                Some("Polygon") => vec![parse_polygon(coords, i)?],
                Some("MultiPolygon") => coords
                    .as_array()
                    .ok_or_else(|| LoadError::Geo(format!("feature {i}: coordinates not an array")))?
                    .iter()
                    .map(|p| parse_polygon(p, i))
                    .collect::<Result<_>>()?,
                other => {
                    log::warn!("Feature {i} ({key}) has unsupported geometry {other:?}, skipped");
                    continue;
                }
            };
            let triangles = polygons
                .iter()
                .filter_map(|rings| rings.first())
                .flat_map(|exterior| triangulate(exterior))
                .collect();
            regions.push(Region {
                key,
                name,
                polygons,
                triangles,
            });
        }
        Ok(GeoLayer { regions })
    }

    /// Count for each region (same order as `regions`), zero when the state
    /// has no cases, plus the state values with no matching region.
    pub fn match_counts(&self, counts: &[CategoryCount]) -> (Vec<usize>, Vec<String>) {
        let per_region = self
            .regions
            .iter()
            .map(|r| {
                counts
                    .iter()
                    .find(|c| c.value == r.key)
                    .map_or(0, |c| c.count)
            })
            .collect();
        let unmatched = counts
            .iter()
            .filter(|c| !self.regions.iter().any(|r| r.key == c.value))
            .map(|c| c.value.clone())
            .collect();
        (per_region, unmatched)
    }

    /// Region with the highest non-zero count. Ties go to the first region.
    pub fn busiest(&self, counts: &[CategoryCount]) -> Option<(&Region, usize)> {
        let (per_region, _) = self.match_counts(counts);
        self.regions
            .iter()
            .zip(per_region)
            .filter(|&(_, n)| n > 0)
            .fold(None, |best, (region, n)| match best {
                Some((_, top)) if top >= n => best,
                _ => Some((region, n)),
            })
    }
}

fn property_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_polygon(value: &JsonValue, feature: usize) -> Result<Vec<Ring>> {
    let bad = || LoadError::Geo(format!("feature {feature}: malformed polygon coordinates"));
    value
        .as_array()
        .ok_or_else(bad)?
        .iter()
        .map(|ring| -> Result<Ring> {
            ring.as_array()
                .ok_or_else(bad)?
                .iter()
                .map(|pt| -> Result<[f64; 2]> {
                    match pt.as_array().map(Vec::as_slice) {
                        Some([x, y, ..]) => {
                            Ok([x.as_f64().ok_or_else(bad)?, y.as_f64().ok_or_else(bad)?])
                        }
                        _ => Err(bad()),
                    }
                })
                .collect()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Ear-clipping triangulation (egui only fills convex shapes)
// ---------------------------------------------------------------------------

fn cross(o: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0])
}

fn signed_area(pts: &[[f64; 2]]) -> f64 {
    let n = pts.len();
    (0..n)
        .map(|i| {
            let (p, q) = (pts[i], pts[(i + 1) % n]);
            p[0] * q[1] - q[0] * p[1]
        })
        .sum::<f64>()
        / 2.0
}

fn in_triangle(p: [f64; 2], a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> bool {
    cross(a, b, p) >= 0.0 && cross(b, c, p) >= 0.0 && cross(c, a, p) >= 0.0
}

/// Split a simple polygon ring into triangles. Self-intersecting input stops
/// early and returns the triangles found so far.
pub fn triangulate(ring: &[[f64; 2]]) -> Vec<Triangle> {
    let mut pts = ring.to_vec();
    if pts.len() > 1 && pts.first() == pts.last() {
        pts.pop();
    }
    if pts.len() < 3 {
        return Vec::new();
    }
    if signed_area(&pts) < 0.0 {
        pts.reverse();
    }

    let mut idx: Vec<usize> = (0..pts.len()).collect();
    let mut out = Vec::with_capacity(pts.len() - 2);
    let mut cursor = 0;
    let mut misses = 0;

    while idx.len() > 3 {
        let n = idx.len();
        if misses >= n {
            log::debug!("triangulation stopped with {n} vertices left");
            break;
        }
        let i = cursor % n;
        let (prev, cur, next) = (idx[(i + n - 1) % n], idx[i], idx[(i + 1) % n]);
        let (a, b, c) = (pts[prev], pts[cur], pts[next]);
        let turn = cross(a, b, c);

        if turn == 0.0 {
            // collinear vertex adds nothing
            idx.remove(i);
            cursor = i;
            misses = 0;
            continue;
        }

        let is_ear = turn > 0.0
            && !idx.iter().any(|&j| {
                let p = pts[j];
                j != prev && j != cur && j != next && p != a && p != b && p != c && in_triangle(p, a, b, c)
            });
        if is_ear {
            out.push([a, b, c]);
            idx.remove(i);
            cursor = i;
            misses = 0;
        } else {
            cursor = i + 1;
            misses += 1;
        }
    }

    if let &[a, b, c] = idx.as_slice() {
        if cross(pts[a], pts[b], pts[c]) != 0.0 {
            out.push([pts[a], pts[b], pts[c]]);
        }
    }
    out
}
