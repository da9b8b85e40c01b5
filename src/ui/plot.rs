use eframe::egui::Ui;
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoints};
use tetanus_dash::data::aggregate::{AgePyramid, CategoryCount, DoseCount, MonthlyPoint, SymptomCount};
use tetanus_dash::data::schema::ColumnSchema;

use crate::color::{self, ColorMap};

pub const CHART_HEIGHT: f32 = 260.0;

/// Axis label for an integer tick that indexes into `labels`.
fn label_at(labels: &[String], mark: GridMark) -> String {
    let v = mark.value;
    if v < 0.0 || v.fract() != 0.0 {
        return String::new();
    }
    labels.get(v as usize).cloned().unwrap_or_default()
}

fn base_plot(id: &str) -> Plot<'_> {
    Plot::new(id)
        .height(CHART_HEIGHT)
        .allow_scroll(false)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_zoom(true)
}

// ---------------------------------------------------------------------------
// Age pyramid (horizontal bars, men left of the midline)
// ---------------------------------------------------------------------------

pub fn age_pyramid(ui: &mut Ui, pyramid: &AgePyramid, schema: &ColumnSchema) {
    let others = ColorMap::new(pyramid.columns.iter().map(|c| c.label.as_str()));

    base_plot("age_pyramid")
        .legend(Legend::default())
        .x_axis_label("Number of cases")
        .y_axis_label("Age")
        .x_axis_formatter(|mark, _range| format!("{}", mark.value.abs()))
        .show(ui, |plot_ui| {
            for col in &pyramid.columns {
                let color = if col.sex == schema.male_token {
                    color::MEN
                } else if col.sex == schema.female_token {
                    color::WOMEN
                } else {
                    others.color_for(&col.label)
                };
                let bars: Vec<Bar> = pyramid
                    .ages
                    .iter()
                    .zip(&col.counts)
                    .filter(|&(_, &n)| n != 0)
                    .map(|(&age, &n)| Bar::new(f64::from(age), n as f64).width(0.9))
                    .collect();
                plot_ui.bar_chart(BarChart::new(bars).horizontal().name(&col.label).color(color));
            }
        });
}

// ---------------------------------------------------------------------------
// Cases and deaths per month
// ---------------------------------------------------------------------------

pub fn monthly_series(ui: &mut Ui, monthly: &[MonthlyPoint]) {
    let labels: Vec<String> = monthly.iter().map(|p| p.month.to_string()).collect();
    let cases: PlotPoints = monthly
        .iter()
        .enumerate()
        .map(|(i, p)| [i as f64, p.cases as f64])
        .collect();
    let deaths: PlotPoints = monthly
        .iter()
        .enumerate()
        .map(|(i, p)| [i as f64, p.deaths as f64])
        .collect();

    base_plot("monthly_series")
        .legend(Legend::default())
        .x_axis_label("Month")
        .y_axis_label("Notifications")
        .x_axis_formatter(move |mark, _range| label_at(&labels, mark))
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(cases).name("Cases").color(color::MEN).width(2.0));
            plot_ui.line(Line::new(deaths).name("Deaths").color(color::WOMEN).width(2.0));
        });
}

// ---------------------------------------------------------------------------
// Bar charts over value counts
// ---------------------------------------------------------------------------

/// One bar per category, in the given order.
pub fn category_bars(ui: &mut Ui, id: &str, counts: &[(String, usize)]) {
    let colors = ColorMap::new(counts.iter().map(|(v, _)| v.as_str()));
    let labels: Vec<String> = counts.iter().map(|(v, _)| v.clone()).collect();
    let bars: Vec<Bar> = counts
        .iter()
        .enumerate()
        .map(|(i, (value, n))| {
            Bar::new(i as f64, *n as f64)
                .name(value)
                .fill(colors.color_for(value))
                .width(0.7)
        })
        .collect();

    base_plot(id)
        .y_axis_label("Cases")
        .x_axis_formatter(move |mark, _range| label_at(&labels, mark))
        .show(ui, |plot_ui| plot_ui.bar_chart(BarChart::new(bars)));
}

pub fn value_counts(ui: &mut Ui, id: &str, counts: &[CategoryCount]) {
    let pairs: Vec<(String, usize)> = counts.iter().map(|c| (c.value.clone(), c.count)).collect();
    category_bars(ui, id, &pairs);
}

pub fn symptoms(ui: &mut Ui, symptoms: &[SymptomCount]) {
    let pairs: Vec<(String, usize)> = symptoms.iter().map(|s| (s.label.clone(), s.count)).collect();
    category_bars(ui, "symptoms", &pairs);
}

/// Histogram of vaccine doses, one bar per dose number.
pub fn dose_histogram(ui: &mut Ui, doses: &[DoseCount]) {
    let bars: Vec<Bar> = doses
        .iter()
        .map(|d| Bar::new(d.doses as f64, d.count as f64).width(1.0))
        .collect();

    base_plot("dose_histogram")
        .x_axis_label("Doses")
        .y_axis_label("Cases")
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(color::MEN).name("Cases"))
        });
}
