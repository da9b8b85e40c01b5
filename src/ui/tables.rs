use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};
use tetanus_dash::data::aggregate::{CategoryCount, YearLethality};

const ROW_HEIGHT: f32 = 18.0;

/// Cases, deaths and lethality rate per notification year.
pub fn lethality(ui: &mut Ui, rows: &[YearLethality]) {
    ui.push_id("lethality_table", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .columns(Column::auto().at_least(70.0), 4)
            .header(20.0, |mut header| {
                for title in ["Year", "Cases", "Deaths", "Lethality (%)"] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|mut body| {
                for row in rows {
                    body.row(ROW_HEIGHT, |mut r| {
                        r.col(|ui| {
                            ui.label(&row.year);
                        });
                        r.col(|ui| {
                            ui.label(row.total.to_string());
                        });
                        r.col(|ui| {
                            ui.label(row.deaths.to_string());
                        });
                        r.col(|ui| {
                            ui.label(format!("{:.1}", row.rate));
                        });
                    });
                }
            });
    });
}

/// Two-column value/count table.
pub fn value_counts(ui: &mut Ui, id: &str, title: &str, counts: &[CategoryCount]) {
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .column(Column::auto().at_least(90.0))
            .column(Column::auto().at_least(60.0))
            .header(20.0, |mut header| {
                header.col(|ui| {
                    ui.strong(title);
                });
                header.col(|ui| {
                    ui.strong("Cases");
                });
            })
            .body(|mut body| {
                for c in counts {
                    body.row(ROW_HEIGHT, |mut r| {
                        r.col(|ui| {
                            ui.label(&c.value);
                        });
                        r.col(|ui| {
                            ui.label(c.count.to_string());
                        });
                    });
                }
            });
    });
}
