use crate::models::{ForeignKey, Table};
use serde::{Deserialize, Serialize};

/// One complete, internally consistent capture of the schema. Produced
/// wholesale by the schema reader and never mutated afterwards; consumers
/// must not mix tables from one snapshot with foreign keys from another.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    pub tables: Vec<Table>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl SchemaSnapshot {
    pub fn empty() -> Self {
        SchemaSnapshot {
            tables: vec![],
            foreign_keys: vec![],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn foreign_keys_from<'a>(
        &'a self,
        table_name: &'a str,
    ) -> impl Iterator<Item = &'a ForeignKey> {
        self.foreign_keys
            .iter()
            .filter(move |fk| fk.source_table == table_name)
    }
}
