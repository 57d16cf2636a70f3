use crate::engine::{EngineConnection, EngineRow, FromRow};
use crate::models::*;
use crate::quoting::quote_literal;
use crate::Result;
use std::collections::{HashMap, HashSet};
use tracing::instrument;

/// Discovers the schema by querying the engine's catalog views and
/// assembles it into a [SchemaSnapshot].
pub struct SchemaReader<'a> {
    connection: &'a EngineConnection,
}

impl SchemaReader<'_> {
    pub fn new(connection: &EngineConnection) -> SchemaReader {
        SchemaReader { connection }
    }

    /// Reads the full schema in one pass. Nothing is published on failure;
    /// the caller keeps whatever snapshot it had before.
    #[instrument(skip_all)]
    pub async fn introspect_schema(&self) -> Result<SchemaSnapshot> {
        let table_names = self.get_table_names().await?;

        // One table at a time. The engine is a single logical connection,
        // and the sequential loop keeps the output order deterministic.
        let mut tables = Vec::with_capacity(table_names.len());
        for table_name in &table_names {
            let columns = self.get_columns(table_name).await?;
            let primary_key_columns = self.get_primary_key_columns(table_name).await?;
            let references = self.get_foreign_key_references(table_name).await?;

            let columns = columns
                .into_iter()
                .map(|c| {
                    let is_primary_key = primary_key_columns.contains(&c.column_name);
                    let reference = references.get(&c.column_name).cloned();
                    c.into_column(is_primary_key, reference)
                })
                .collect();

            tables.push(Table {
                name: table_name.clone(),
                columns,
            });
        }

        let foreign_keys = self.get_foreign_keys().await?;

        Ok(SchemaSnapshot {
            tables,
            foreign_keys,
        })
    }

    async fn get_table_names(&self) -> Result<Vec<String>> {
        //language=postgresql
        self.connection
            .get_single_results(
                r#"
            select table_name from information_schema.tables
            where table_schema = 'public' and table_type = 'BASE TABLE'
            order by table_name;
            "#,
            )
            .await
    }

    async fn get_columns(&self, table_name: &str) -> Result<Vec<TableColumnResult>> {
        //language=postgresql
        self.connection
            .get_results(&format!(
                r#"
            select column_name, ordinal_position, data_type, is_nullable, column_default
            from information_schema.columns
            where table_schema = 'public' and table_name = {}
            order by ordinal_position;
            "#,
                quote_literal(table_name)
            ))
            .await
    }

    async fn get_primary_key_columns(&self, table_name: &str) -> Result<HashSet<String>> {
        //language=postgresql
        let names = self
            .connection
            .get_single_results::<String>(&format!(
                r#"
            select a.attname from pg_index i
            join pg_attribute a on a.attrelid = i.indrelid and a.attnum = any(i.indkey)
            where i.indrelid = {}::regclass and i.indisprimary;
            "#,
                quote_literal(table_name)
            ))
            .await?;

        Ok(names.into_iter().collect())
    }

    async fn get_foreign_key_references(
        &self,
        table_name: &str,
    ) -> Result<HashMap<String, ColumnReference>> {
        //language=postgresql
        let rows: Vec<ForeignKeyColumnResult> = self
            .connection
            .get_results(&format!(
                r#"
            select kcu.column_name, ccu.table_name, ccu.column_name
            from information_schema.table_constraints tc
            join information_schema.key_column_usage kcu
              on tc.constraint_name = kcu.constraint_name and tc.table_schema = kcu.table_schema
            join information_schema.constraint_column_usage ccu
              on tc.constraint_name = ccu.constraint_name and tc.table_schema = ccu.table_schema
            where tc.constraint_type = 'FOREIGN KEY'
              and tc.table_schema = 'public' and tc.table_name = {};
            "#,
                quote_literal(table_name)
            ))
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                (
                    r.column_name,
                    ColumnReference {
                        table: r.target_table,
                        column: r.target_column,
                    },
                )
            })
            .collect())
    }

    async fn get_foreign_keys(&self) -> Result<Vec<ForeignKey>> {
        //language=postgresql
        let rows: Vec<ForeignKeyResult> = self
            .connection
            .get_results(
                r#"
            select tc.constraint_name, tc.table_name, kcu.column_name, ccu.table_name, ccu.column_name
            from information_schema.table_constraints tc
            join information_schema.key_column_usage kcu
              on tc.constraint_name = kcu.constraint_name and tc.table_schema = kcu.table_schema
            join information_schema.constraint_column_usage ccu
              on tc.constraint_name = ccu.constraint_name and tc.table_schema = ccu.table_schema
            where tc.constraint_type = 'FOREIGN KEY' and tc.table_schema = 'public'
            order by tc.constraint_name;
            "#,
            )
            .await?;

        Ok(rows.into_iter().map(|r| r.into_foreign_key()).collect())
    }
}

#[derive(Debug, Eq, PartialEq)]
struct TableColumnResult {
    column_name: String,
    ordinal_position: i32,
    data_type: String,
    is_nullable: bool,
    column_default: Option<String>,
}

impl FromRow for TableColumnResult {
    fn from_row(row: &EngineRow) -> Result<Self> {
        Ok(TableColumnResult {
            column_name: row.try_get(0)?,
            ordinal_position: row.try_get(1)?,
            data_type: row.try_get(2)?,
            is_nullable: row.try_get::<String>(3)? != "NO",
            column_default: row.try_get(4)?,
        })
    }
}

impl TableColumnResult {
    fn into_column(self, is_primary_key: bool, reference: Option<ColumnReference>) -> Column {
        Column {
            name: self.column_name,
            ordinal_position: self.ordinal_position,
            data_type: self.data_type,
            is_nullable: self.is_nullable,
            default_expression: self.column_default,
            is_primary_key,
            reference,
        }
    }
}

#[derive(Debug, Eq, PartialEq)]
struct ForeignKeyColumnResult {
    column_name: String,
    target_table: String,
    target_column: String,
}

impl FromRow for ForeignKeyColumnResult {
    fn from_row(row: &EngineRow) -> Result<Self> {
        Ok(ForeignKeyColumnResult {
            column_name: row.try_get(0)?,
            target_table: row.try_get(1)?,
            target_column: row.try_get(2)?,
        })
    }
}

#[derive(Debug, Eq, PartialEq)]
struct ForeignKeyResult {
    constraint_name: String,
    table_name: String,
    column_name: String,
    target_table: String,
    target_column: String,
}

impl FromRow for ForeignKeyResult {
    fn from_row(row: &EngineRow) -> Result<Self> {
        Ok(ForeignKeyResult {
            constraint_name: row.try_get(0)?,
            table_name: row.try_get(1)?,
            column_name: row.try_get(2)?,
            target_table: row.try_get(3)?,
            target_column: row.try_get(4)?,
        })
    }
}

impl ForeignKeyResult {
    fn into_foreign_key(self) -> ForeignKey {
        ForeignKey {
            constraint_name: self.constraint_name,
            source_table: self.table_name,
            source_column: self.column_name,
            target_table: self.target_table,
            target_column: self.target_column,
        }
    }
}
