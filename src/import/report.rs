use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Structured result of one import call — the whole contract the caller
/// depends on. Always produced, even when nothing was added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub added: u64,
    pub skipped_duplicates: u64,
    pub errors: Vec<String>,
}

impl ImportOutcome {
    /// Record a per-row failure using the file's visual 1-based row number.
    pub fn push_row_error(&mut self, row_number: usize, message: impl Display) {
        self.errors.push(format!("Row {row_number}: {message}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_errors_carry_visual_numbers() {
        let mut outcome = ImportOutcome::default();
        outcome.push_row_error(17, "missing required field: barangay");
        assert_eq!(
            outcome.errors,
            vec!["Row 17: missing required field: barangay"]
        );
    }

    #[test]
    fn serializes_to_the_wire_shape() {
        let outcome = ImportOutcome {
            added: 3,
            skipped_duplicates: 1,
            errors: vec!["Row 9: missing required field: barangay".into()],
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["added"], 3);
        assert_eq!(json["skipped_duplicates"], 1);
        assert_eq!(json["errors"][0], "Row 9: missing required field: barangay");
    }
}
