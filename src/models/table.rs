use crate::models::Column;
use crate::quoting::quote_identifier;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(name: &str) -> Self {
        Table {
            name: name.to_string(),
            columns: vec![],
        }
    }

    pub fn primary_key_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_primary_key)
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn get_create_statement(&self) -> String {
        let mut sql = format!("create table {} (\n", quote_identifier(&self.name));

        let mut lines = Vec::with_capacity(self.columns.len() + 1);

        for column in self
            .columns
            .iter()
            .sorted_by_key(|c| c.ordinal_position)
        {
            let mut line = format!(
                "    {} {}",
                quote_identifier(&column.name),
                column.reconstructed_data_type()
            );

            if let Some(default) = column.reconstructed_default() {
                line.push_str(" default ");
                line.push_str(default);
            }

            if !column.is_nullable {
                line.push_str(" not null");
            }

            lines.push(line);
        }

        let primary_key = self
            .primary_key_columns()
            .map(|c| quote_identifier(&c.name))
            .join(", ");

        if !primary_key.is_empty() {
            lines.push(format!("    primary key ({})", primary_key));
        }

        sql.push_str(&lines.join(",\n"));
        sql.push_str("\n);");

        sql
    }

    pub fn get_drop_statement(&self) -> String {
        format!(
            "drop table if exists {} cascade;",
            quote_identifier(&self.name)
        )
    }
}
