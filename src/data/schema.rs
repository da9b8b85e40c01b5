use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ColumnSchema – column names and literal tokens of the case dataset
// ---------------------------------------------------------------------------

/// One binary symptom flag: source column and the label shown in charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomColumn {
    pub column: String,
    pub label: String,
}

impl SymptomColumn {
    fn new(column: &str, label: &str) -> Self {
        Self {
            column: column.to_string(),
            label: label.to_string(),
        }
    }
}

/// Names of the columns read from the dataset and the literal tokens the
/// aggregators compare against. Defaults follow the SINAN tetanus export.
///
/// Raw sex tokens and their display labels are separate so datasets that
/// spell sexes differently (`Masculino` vs `Homens`) only need configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSchema {
    pub year: String,
    pub state: String,
    pub sex: String,
    pub age: String,
    pub investigation_date: String,
    pub death_date: String,
    pub education: String,
    pub race: String,
    pub infection_site: String,
    pub doses: String,
    pub prophylaxis: String,
    pub outcome: String,
    pub symptoms: Vec<SymptomColumn>,

    pub male_token: String,
    pub female_token: String,
    pub male_label: String,
    pub female_label: String,
    pub affirmative_token: String,
    pub death_token: String,
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self {
            year: "NU_ANO".into(),
            state: "SG_UF_NOT".into(),
            sex: "CS_SEXO".into(),
            age: "IDADE".into(),
            investigation_date: "DT_INVEST".into(),
            death_date: "DT_OBITO".into(),
            education: "CS_ESCOL_N".into(),
            race: "CS_RACA".into(),
            infection_site: "LOC_INFEC".into(),
            doses: "NU_DOSES".into(),
            prophylaxis: "TP_PROFILA".into(),
            outcome: "EVOLUCAO".into(),
            symptoms: vec![
                SymptomColumn::new("TRISMO", "Trismo"),
                SymptomColumn::new("RISO", "Riso sardônico"),
                SymptomColumn::new("OPISTOTONO", "Opistótono"),
                SymptomColumn::new("RIG_NUCA", "Rigidez de nuca"),
                SymptomColumn::new("RIG_ABDOM", "Rigidez abdominal"),
                SymptomColumn::new("RIG_MEMBRO", "Rigidez de membros"),
                SymptomColumn::new("CRISES", "Crises contraturais"),
            ],
            male_token: "Masculino".into(),
            female_token: "Feminino".into(),
            male_label: "Homens".into(),
            female_label: "Mulheres".into(),
            affirmative_token: "Sim".into(),
            death_token: "Óbito".into(),
        }
    }
}

impl ColumnSchema {
    /// Columns the loader refuses to run without.
    pub fn required_columns(&self) -> [&str; 3] {
        [&self.year, &self.state, &self.sex]
    }

    /// Columns that feed a chart but may be absent from the file.
    pub fn optional_columns(&self) -> impl Iterator<Item = &str> {
        [
            &self.age,
            &self.investigation_date,
            &self.death_date,
            &self.education,
            &self.race,
            &self.infection_site,
            &self.doses,
            &self.prophylaxis,
            &self.outcome,
        ]
        .into_iter()
        .chain(self.symptoms.iter().map(|s| &s.column))
        .map(String::as_str)
    }

    /// Display label for a raw sex value.
    pub fn sex_label<'a>(&'a self, raw: &'a str) -> &'a str {
        if raw == self.male_token {
            &self.male_label
        } else if raw == self.female_token {
            &self.female_label
        } else {
            raw
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_seven_symptoms() {
        assert_eq!(ColumnSchema::default().symptoms.len(), 7);
    }

    #[test]
    fn sex_labels_rename_known_tokens_only() {
        let schema = ColumnSchema::default();
        assert_eq!(schema.sex_label("Masculino"), "Homens");
        assert_eq!(schema.sex_label("Feminino"), "Mulheres");
        assert_eq!(schema.sex_label("Ignorado"), "Ignorado");
    }
}
