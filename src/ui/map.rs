use eframe::egui::{Color32, RichText, Stroke, Ui};
use egui_plot::{Line, Plot, PlotPoints, Polygon};
use tetanus_dash::data::aggregate::CategoryCount;
use tetanus_dash::geo::GeoLayer;

use crate::color;

const MAP_HEIGHT: f32 = 420.0;

/// Cases per state, filled on a sequential ramp scaled to the busiest state.
pub fn choropleth(ui: &mut Ui, layer: &GeoLayer, counts: &[CategoryCount]) {
    let (per_region, unmatched) = layer.match_counts(counts);
    let max = per_region.iter().copied().max().unwrap_or(0).max(1);

    Plot::new("choropleth")
        .height(MAP_HEIGHT)
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (region, &count) in layer.regions.iter().zip(&per_region) {
                let fill = color::sequential(count as f32 / max as f32);
                for tri in &region.triangles {
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::from(tri.to_vec()))
                            .fill_color(fill)
                            .stroke(Stroke::NONE),
                    );
                }
                for exterior in region.polygons.iter().filter_map(|rings| rings.first()) {
                    plot_ui.line(
                        Line::new(PlotPoints::from(exterior.clone()))
                            .color(Color32::DARK_GRAY)
                            .width(0.5),
                    );
                }
            }
        });

    ui.horizontal(|ui: &mut Ui| {
        ui.label(RichText::new("0").color(color::sequential(0.0)).strong());
        ui.label("→");
        ui.label(RichText::new(max.to_string()).color(color::sequential(1.0)).strong());
        ui.label("cases");
    });
    if let Some((region, count)) = layer.busiest(counts) {
        ui.label(format!("Most cases: {} ({count})", region.display_name()));
    }
    if !unmatched.is_empty() {
        ui.label(RichText::new(format!("No map region for: {}", unmatched.join(", "))).weak());
    }
}
