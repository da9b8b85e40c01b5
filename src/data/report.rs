use serde::Serialize;

use super::aggregate::{
    age_pyramid, categorical_counts, dose_histogram, lethality_by_year, monthly_series,
    state_counts, symptom_frequency, AgePyramid, CategoryCount, DoseCount, MonthlyPoint,
    SymptomCount, YearLethality,
};
use super::filter::{FilterSelection, FilteredView};
use super::model::CaseTable;
use super::schema::ColumnSchema;

/// Every aggregate the dashboard renders for one filter selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub total_records: usize,
    pub filtered_records: usize,
    pub selection: FilterSelection,
    pub age_pyramid: AgePyramid,
    pub monthly: Vec<MonthlyPoint>,
    pub education: Vec<CategoryCount>,
    pub race: Vec<CategoryCount>,
    pub infection_site: Vec<CategoryCount>,
    pub prophylaxis: Vec<CategoryCount>,
    pub states: Vec<CategoryCount>,
    pub doses: Vec<DoseCount>,
    pub symptoms: Vec<SymptomCount>,
    pub lethality: Vec<YearLethality>,
}

/// Compute the full report for a table and a filter selection.
pub fn build_report(
    table: &CaseTable,
    selection: &FilterSelection,
    schema: &ColumnSchema,
) -> DashboardReport {
    let view = FilteredView::new(table, selection);
    log::debug!("Building report over {}/{} records", view.len(), table.len());

    DashboardReport {
        total_records: table.len(),
        filtered_records: view.len(),
        selection: selection.clone(),
        age_pyramid: age_pyramid(&view, schema),
        monthly: monthly_series(&view),
        education: categorical_counts(&view, &schema.education),
        race: categorical_counts(&view, &schema.race),
        infection_site: categorical_counts(&view, &schema.infection_site),
        prophylaxis: categorical_counts(&view, &schema.prophylaxis),
        states: state_counts(&view),
        doses: dose_histogram(&view),
        symptoms: symptom_frequency(&view, schema),
        lethality: lethality_by_year(&view, schema),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::parse_csv;

    const CSV: &str = "NU_ANO,SG_UF_NOT,CS_SEXO,IDADE,CS_RACA,EVOLUCAO,TRISMO\n\
                       2019,SP,Masculino,40,Branca,Óbito,Sim\n\
                       2019,RJ,Feminino,52,Parda,Cura,Sim\n\
                       2020,SP,Feminino,33,Parda,Cura,Não\n";

    #[test]
    fn report_follows_selection() {
        let schema = ColumnSchema::default();
        let table = parse_csv(CSV, &schema).unwrap();

        let all = build_report(&table, &FilterSelection::all(&table), &schema);
        assert_eq!(all.total_records, 3);
        assert_eq!(all.filtered_records, 3);
        assert_eq!(all.race[0].value, "Parda");
        assert_eq!(all.symptoms[0].count, 2);
        assert!(all.education.is_empty());

        let mut sel = FilterSelection::all(&table);
        sel.states.remove("RJ");
        let sp = build_report(&table, &sel, &schema);
        assert_eq!(sp.filtered_records, 2);
        assert_eq!(sp.states.len(), 1);
        assert_eq!(sp.lethality[0].rate, 100.0);
        assert_eq!(sp.age_pyramid.total_abs(), 2);
    }

    #[test]
    fn empty_selection_yields_empty_aggregates() {
        let schema = ColumnSchema::default();
        let table = parse_csv(CSV, &schema).unwrap();
        let mut sel = FilterSelection::all(&table);
        sel.years.clear();

        let report = build_report(&table, &sel, &schema);
        assert_eq!(report.filtered_records, 0);
        assert!(report.monthly.is_empty());
        assert!(report.lethality.is_empty());
        assert!(report.symptoms.iter().all(|s| s.count == 0));
    }

    #[test]
    fn report_serializes_to_json() {
        let schema = ColumnSchema::default();
        let table = parse_csv(CSV, &schema).unwrap();
        let report = build_report(&table, &FilterSelection::all(&table), &schema);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["filtered_records"], 3);
        assert_eq!(json["age_pyramid"]["columns"][0]["label"], "Homens");
    }
}
