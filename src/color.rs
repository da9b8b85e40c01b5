use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

pub const MEN: Color32 = Color32::from_rgb(70, 130, 180);
pub const WOMEN: Color32 = Color32::from_rgb(250, 128, 114);

fn hsl_to_color32(hsl: Hsl) -> Color32 {
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| hsl_to_color32(Hsl::new((i as f32 / n as f32) * 360.0, 0.75, 0.55)))
        .collect()
}

/// Sequential ramp for the choropleth: `t = 0` is pale, `t = 1` is dark red.
pub fn sequential(t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    hsl_to_color32(Hsl::new(12.0 - 8.0 * t, 0.55 + 0.3 * t, 0.93 - 0.6 * t))
}

// ---------------------------------------------------------------------------
// Color mapping: category value → Color32
// ---------------------------------------------------------------------------

/// Maps category labels to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    pub fn new<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let values: Vec<&str> = values.into_iter().collect();
        let mapping = values
            .iter()
            .zip(generate_palette(values.len()))
            .map(|(v, c)| (v.to_string(), c))
            .collect();
        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    pub fn color_for(&self, value: &str) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_colours_are_distinct() {
        let p = generate_palette(5);
        assert_eq!(p.len(), 5);
        for (i, a) in p.iter().enumerate() {
            assert!(p[i + 1..].iter().all(|b| a != b));
        }
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn ramp_darkens() {
        let light = sequential(0.0);
        let dark = sequential(1.0);
        let sum = |c: Color32| c.r() as u32 + c.g() as u32 + c.b() as u32;
        assert!(sum(light) > sum(dark));
        assert_eq!(sequential(2.0), dark);
    }

    #[test]
    fn unknown_value_falls_back_to_gray() {
        let map = ColorMap::new(["Branca", "Parda"]);
        assert_ne!(map.color_for("Branca"), map.color_for("Parda"));
        assert_eq!(map.color_for("Preta"), Color32::GRAY);
    }
}
