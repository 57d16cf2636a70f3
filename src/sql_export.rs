use crate::dependency_sort::sort_tables_by_dependency;
use crate::engine::{EngineConnection, EngineRow, SqlValue};
use crate::models::{Column, SchemaSnapshot, Table};
use crate::quoting::{quote_identifier, quote_literal};
use crate::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use itertools::Itertools;
use tracing::{instrument, warn};

pub struct SqlExportOptions {
    pub max_rows_per_insert: usize,
    /// Timestamp written into the header comment. Defaults to now; tests
    /// pin it to keep the script reproducible.
    pub generated_at: Option<DateTime<Utc>>,
}

impl Default for SqlExportOptions {
    fn default() -> Self {
        Self {
            max_rows_per_insert: 1000,
            generated_at: None,
        }
    }
}

/// The generated script, plus the tables whose data could not be fetched
/// and was left out.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SqlExport {
    pub script: String,
    pub skipped_tables: Vec<String>,
}

/// Composes a snapshot and live row data into a full SQL script that
/// recreates the database: drops, creates, foreign keys, row inserts and
/// sequence resets, in dependency-safe order.
pub struct SqlExporter<'a> {
    connection: &'a EngineConnection,
}

impl SqlExporter<'_> {
    pub fn new(connection: &EngineConnection) -> SqlExporter {
        SqlExporter { connection }
    }

    #[instrument(skip_all)]
    pub async fn export_database(
        &self,
        snapshot: &SchemaSnapshot,
        options: &SqlExportOptions,
    ) -> Result<SqlExport> {
        let ordered = sort_tables_by_dependency(&snapshot.tables, &snapshot.foreign_keys);

        let mut script = String::new();

        let generated_at = options.generated_at.unwrap_or_else(Utc::now);
        script.push_str("-- database export\n");
        script.push_str(&format!(
            "-- generated at {}\n\n",
            generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        ));

        // Dependents first, so no drop ever hits a still-referenced table.
        for table in ordered.iter().rev() {
            script.push_str(&table.get_drop_statement());
            script.push('\n');
        }
        script.push('\n');

        for table in &ordered {
            script.push_str(&table.get_create_statement());
            script.push_str("\n\n");
        }

        for fk in ordered
            .iter()
            .flat_map(|t| snapshot.foreign_keys_from(&t.name))
        {
            script.push_str(&fk.get_create_statement());
            script.push('\n');
        }
        if !snapshot.foreign_keys.is_empty() {
            script.push('\n');
        }

        let mut skipped_tables = vec![];
        for table in &ordered {
            match self.fetch_table_rows(table).await {
                Ok(rows) => write_insert_statements(&mut script, table, &rows, options),
                Err(e) => {
                    warn!(
                        "Skipping data for table {}, fetching rows failed: {}",
                        table.name, e
                    );
                    skipped_tables.push(table.name.clone());
                }
            }
        }

        for table in &ordered {
            for column in table.primary_key_columns() {
                script.push_str(&sequence_reset_statement(table, column));
                script.push('\n');
            }
        }

        Ok(SqlExport {
            script,
            skipped_tables,
        })
    }

    async fn fetch_table_rows(&self, table: &Table) -> Result<Vec<EngineRow>> {
        let output = self
            .connection
            .query(&format!("select * from {};", quote_identifier(&table.name)))
            .await?;

        Ok(output.rows)
    }
}

fn write_insert_statements(
    script: &mut String,
    table: &Table,
    rows: &[EngineRow],
    options: &SqlExportOptions,
) {
    if rows.is_empty() {
        return;
    }

    let column_list = table
        .columns
        .iter()
        .sorted_by_key(|c| c.ordinal_position)
        .map(|c| quote_identifier(&c.name))
        .join(", ");

    for (index, row) in rows.iter().enumerate() {
        if index % options.max_rows_per_insert == 0 {
            if index > 0 {
                script.push_str(";\n\n");
            }
            script.push_str(&format!(
                "insert into {} ({}) values\n",
                quote_identifier(&table.name),
                column_list
            ));
        } else {
            script.push_str(",\n");
        }

        let values = row.values().iter().map(render_value).join(", ");
        script.push('(');
        script.push_str(&values);
        script.push(')');
    }

    script.push_str(";\n\n");
}

fn render_value(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "null".to_string(),
        SqlValue::Bool(b) => b.to_string(),
        SqlValue::Int(i) => i.to_string(),
        SqlValue::Float(f) => {
            let f = f.into_inner();
            if f.is_nan() {
                "'NaN'".to_string()
            } else if f == f64::INFINITY {
                "'Infinity'".to_string()
            } else if f == f64::NEG_INFINITY {
                "'-Infinity'".to_string()
            } else {
                f.to_string()
            }
        }
        SqlValue::Text(s) => quote_literal(s),
        SqlValue::Timestamp(ts) => {
            quote_literal(&ts.to_rfc3339_opts(SecondsFormat::Secs, true))
        }
    }
}

/// Moves the backing sequence of a primary-key column past the values that
/// are already in the table, so inserts after an import do not collide.
fn sequence_reset_statement(table: &Table, column: &Column) -> String {
    format!(
        "select setval(pg_get_serial_sequence({}, {}), coalesce((select max({}) from {}), 1), true);",
        quote_literal(&table.name),
        quote_literal(&column.name),
        quote_identifier(&column.name),
        quote_identifier(&table.name),
    )
}
