use eframe::egui::{self, RichText, ScrollArea, Ui};

use crate::state::AppState;
use crate::ui::{map, panels, plot, tables};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct TetanusDashApp {
    pub state: AppState,
}

impl TetanusDashApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for TetanusDashApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: charts ----
        egui::CentralPanel::default().show(ctx, |ui| {
            dashboard(ui, &self.state);
        });
    }
}

fn section(ui: &mut Ui, title: &str) {
    ui.add_space(8.0);
    ui.heading(title);
    ui.separator();
}

fn dashboard(ui: &mut Ui, state: &AppState) {
    let Some(report) = &state.report else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view cases  (File → Open…)");
        });
        return;
    };
    let schema = state.schema();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Confirmed tetanus cases");
            ui.label(RichText::new(format!("Total records: {}", report.filtered_records)).strong());

            section(ui, "Age pyramid");
            plot::age_pyramid(ui, &report.age_pyramid, schema);

            section(ui, "Cases and deaths per month");
            plot::monthly_series(ui, &report.monthly);

            section(ui, "Cases per state");
            match &state.geo {
                Some(layer) => {
                    ui.columns(2, |cols| {
                        map::choropleth(&mut cols[0], layer, &report.states);
                        tables::value_counts(&mut cols[1], "state_table", "State", &report.states);
                    });
                }
                None => plot::value_counts(ui, "state_bars", &report.states),
            }

            ui.columns(2, |cols| {
                section(&mut cols[0], "Education");
                plot::value_counts(&mut cols[0], "education", &report.education);
                section(&mut cols[1], "Race");
                plot::value_counts(&mut cols[1], "race", &report.race);
            });

            ui.columns(2, |cols| {
                section(&mut cols[0], "Probable infection site");
                plot::value_counts(&mut cols[0], "infection_site", &report.infection_site);
                section(&mut cols[1], "Post-exposure prophylaxis");
                plot::value_counts(&mut cols[1], "prophylaxis", &report.prophylaxis);
            });

            ui.columns(2, |cols| {
                section(&mut cols[0], "Vaccine doses");
                plot::dose_histogram(&mut cols[0], &report.doses);
                section(&mut cols[1], "Symptoms");
                plot::symptoms(&mut cols[1], &report.symptoms);
            });

            section(ui, "Lethality by year");
            tables::lethality(ui, &report.lethality);
        });
}
