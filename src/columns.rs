/// Column-role matching tokens. These are explicit configuration rather
/// than conventions buried in the matching code; `Default` carries the
/// production spellings.
#[derive(Debug, Clone)]
pub struct ColumnRules {
    pub id_tokens: Vec<String>,
    pub tee_prefix: String,
    pub ica_prefix: String,
    pub final_tokens: Vec<String>,
}

impl Default for ColumnRules {
    fn default() -> Self {
        Self {
            id_tokens: vec!["Add.ID".to_string(), "Student".to_string()],
            tee_prefix: "TEE_".to_string(),
            ica_prefix: "ICA_".to_string(),
            final_tokens: vec!["Final_Marks".to_string(), "Final Marks".to_string()],
        }
    }
}

impl ColumnRules {
    pub fn header_marker(&self) -> &str {
        self.id_tokens.first().map(String::as_str).unwrap_or("Add.ID")
    }

    pub fn subject_of<'a>(&self, tee_column: &'a str) -> &'a str {
        tee_column.strip_prefix(&self.tee_prefix).unwrap_or(tee_column)
    }

    pub fn ica_column(&self, subject: &str) -> String {
        format!("{}{}", self.ica_prefix, subject)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ColumnRoles {
    pub id_cols: Vec<String>,
    pub tee_cols: Vec<String>,
    pub ica_cols: Vec<String>,
    pub final_cols: Vec<String>,
}

impl ColumnRoles {
    pub fn primary_id(&self) -> Option<&str> {
        self.id_cols.first().map(String::as_str)
    }
}

/// Partitions flattened column names by role. Columns matching no rule are
/// inert and simply stay out of every partition.
pub fn classify(columns: &[String], rules: &ColumnRules) -> ColumnRoles {
    let mut roles = ColumnRoles::default();
    for name in columns {
        if rules.id_tokens.iter().any(|token| name.contains(token.as_str())) {
            roles.id_cols.push(name.clone());
        }
        if name.starts_with(&rules.tee_prefix) {
            roles.tee_cols.push(name.clone());
        }
        if name.starts_with(&rules.ica_prefix) {
            roles.ica_cols.push(name.clone());
        }
        if rules
            .final_tokens
            .iter()
            .any(|token| name.contains(token.as_str()))
        {
            roles.final_cols.push(name.clone());
        }
    }
    roles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn partitions_by_role() {
        let columns = names(&[
            "Add.ID",
            "Student Name",
            "TEE_Math",
            "ICA_Math",
            "Final_Marks_Math",
            "Remarks_Math",
        ]);
        let roles = classify(&columns, &ColumnRules::default());

        assert_eq!(roles.id_cols, names(&["Add.ID", "Student Name"]));
        assert_eq!(roles.tee_cols, names(&["TEE_Math"]));
        assert_eq!(roles.ica_cols, names(&["ICA_Math"]));
        assert_eq!(roles.final_cols, names(&["Final_Marks_Math"]));
        assert_eq!(roles.primary_id(), Some("Add.ID"));
    }

    #[test]
    fn unmatched_columns_are_inert() {
        let columns = names(&["Add.ID", "Remarks_Math"]);
        let roles = classify(&columns, &ColumnRules::default());
        assert!(roles.tee_cols.is_empty());
        assert!(roles.final_cols.is_empty());
    }

    #[test]
    fn final_token_matches_both_spellings() {
        let columns = names(&["Final_Marks_Math", "Final Marks_English"]);
        let roles = classify(&columns, &ColumnRules::default());
        assert_eq!(roles.final_cols.len(), 2);
    }

    #[test]
    fn prefix_match_is_anchored_at_the_start() {
        let columns = names(&["Math_TEE_old", "TEE_Math"]);
        let roles = classify(&columns, &ColumnRules::default());
        assert_eq!(roles.tee_cols, names(&["TEE_Math"]));
    }

    #[test]
    fn subject_derivation_strips_the_tee_prefix() {
        let rules = ColumnRules::default();
        assert_eq!(rules.subject_of("TEE_Math"), "Math");
        assert_eq!(rules.ica_column("Math"), "ICA_Math");
    }
}
