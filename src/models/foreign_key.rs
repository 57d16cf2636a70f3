use crate::quoting::quote_identifier;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One foreign-key relationship between two tables. Doubles as the edge set
/// for the relationship diagram and for export ordering.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub constraint_name: String,
    pub source_table: String,
    pub source_column: String,
    pub target_table: String,
    pub target_column: String,
}

impl ForeignKey {
    pub fn is_self_reference(&self) -> bool {
        self.source_table == self.target_table
    }

    /// The constraint is recreated under a deterministic name derived from
    /// the referencing table and column, not the catalog name it had.
    pub fn get_create_statement(&self) -> String {
        format!(
            "alter table {} add constraint {} foreign key ({}) references {} ({});",
            quote_identifier(&self.source_table),
            quote_identifier(&format!(
                "fk_{}_{}",
                self.source_table, self.source_column
            )),
            quote_identifier(&self.source_column),
            quote_identifier(&self.target_table),
            quote_identifier(&self.target_column),
        )
    }
}

impl Ord for ForeignKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.constraint_name.cmp(&other.constraint_name)
    }
}

impl PartialOrd for ForeignKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
