use crate::engine::{
    EngineError, EngineRow, FieldDescription, QueryOutput, SqlEngine, SqlValue,
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// An in-memory stand-in for the embedded engine. It answers the catalog
/// queries the schema reader issues from a fixed table description, serves
/// row data for exports, and records every executed statement so tests can
/// assert on ordering.
///
/// Cloning shares the underlying state, so tests can keep a handle after
/// moving a clone into an [crate::EngineConnection].
#[derive(Clone, Default)]
pub struct FakeEngine {
    inner: Arc<Mutex<FakeEngineInner>>,
}

#[derive(Default)]
struct FakeEngineInner {
    tables: Vec<FakeTable>,
    executed: Vec<String>,
    queried: Vec<String>,
    fail_on: Vec<String>,
}

#[derive(Clone)]
pub struct FakeTable {
    pub name: String,
    pub columns: Vec<FakeColumn>,
    pub rows: Vec<Vec<SqlValue>>,
}

#[derive(Clone)]
pub struct FakeColumn {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub default_expression: Option<String>,
    pub is_primary_key: bool,
    pub references: Option<(String, String)>,
}

impl FakeTable {
    pub fn new(name: &str) -> Self {
        FakeTable {
            name: name.to_string(),
            columns: vec![],
            rows: vec![],
        }
    }

    pub fn column(mut self, column: FakeColumn) -> Self {
        self.columns.push(column);
        self
    }

    pub fn row(mut self, values: Vec<SqlValue>) -> Self {
        self.rows.push(values);
        self
    }
}

impl FakeColumn {
    pub fn new(name: &str, data_type: &str) -> Self {
        FakeColumn {
            name: name.to_string(),
            data_type: data_type.to_string(),
            is_nullable: true,
            default_expression: None,
            is_primary_key: false,
            references: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.is_nullable = false;
        self
    }

    pub fn default_expression(mut self, expression: &str) -> Self {
        self.default_expression = Some(expression.to_string());
        self
    }

    pub fn references(mut self, table: &str, column: &str) -> Self {
        self.references = Some((table.to_string(), column.to_string()));
        self
    }
}

impl FakeEngine {
    pub fn with_tables(tables: Vec<FakeTable>) -> Self {
        let engine = FakeEngine::default();
        engine.inner.lock().unwrap().tables = tables;
        engine
    }

    /// Any query or statement containing `needle` fails with a simulated
    /// engine error.
    pub fn fail_on(&self, needle: &str) {
        self.inner.lock().unwrap().fail_on.push(needle.to_string());
    }

    /// Every statement passed to `execute`, in order.
    pub fn executed(&self) -> Vec<String> {
        self.inner.lock().unwrap().executed.clone()
    }

    /// Every query passed to `query`, in order.
    pub fn queried(&self) -> Vec<String> {
        self.inner.lock().unwrap().queried.clone()
    }
}

impl FakeEngineInner {
    fn check_failure(&self, sql: &str) -> Result<(), EngineError> {
        for needle in &self.fail_on {
            if sql.contains(needle.as_str()) {
                return Err(EngineError::new(format!(
                    "simulated engine failure on `{}`",
                    needle
                )));
            }
        }
        Ok(())
    }

    fn respond(&self, sql: &str) -> Result<QueryOutput, EngineError> {
        if sql.contains("information_schema.tables") {
            return Ok(self.list_tables());
        }

        if sql.contains("information_schema.columns") {
            let table = quoted_after(sql, "table_name = ")
                .ok_or_else(|| EngineError::new("missing table name in columns query"))?;
            return Ok(self.list_columns(&table));
        }

        if sql.contains("pg_index") {
            let table = quoted_after(sql, "indrelid = ")
                .ok_or_else(|| EngineError::new("missing table name in primary key query"))?;
            return Ok(self.list_primary_key_columns(&table));
        }

        if sql.contains("constraint_column_usage") {
            if let Some(table) = quoted_after(sql, "tc.table_name = ") {
                return Ok(self.list_foreign_key_references(&table));
            }
            return Ok(self.list_foreign_keys());
        }

        if let Some(rest) = sql.strip_prefix("select * from ") {
            let table = rest.trim().trim_end_matches(';').trim_matches('"');
            return self.table_data(table);
        }

        Err(EngineError::new(format!(
            "fake engine does not understand query: {}",
            sql
        )))
    }

    fn list_tables(&self) -> QueryOutput {
        let mut names: Vec<&str> = self.tables.iter().map(|t| t.name.as_str()).collect();
        names.sort_unstable();

        QueryOutput {
            fields: vec![field("table_name")],
            rows: names
                .into_iter()
                .map(|n| EngineRow::new(vec![SqlValue::Text(n.to_string())]))
                .collect(),
        }
    }

    fn list_columns(&self, table: &str) -> QueryOutput {
        let rows = self
            .find_table(table)
            .map(|t| {
                t.columns
                    .iter()
                    .enumerate()
                    .map(|(index, c)| {
                        EngineRow::new(vec![
                            SqlValue::Text(c.name.clone()),
                            SqlValue::Int(index as i64 + 1),
                            SqlValue::Text(c.data_type.clone()),
                            SqlValue::Text(String::from(if c.is_nullable { "YES" } else { "NO" })),
                            c.default_expression
                                .clone()
                                .map(SqlValue::Text)
                                .unwrap_or(SqlValue::Null),
                        ])
                    })
                    .collect()
            })
            .unwrap_or_default();

        QueryOutput {
            fields: vec![
                field("column_name"),
                field("ordinal_position"),
                field("data_type"),
                field("is_nullable"),
                field("column_default"),
            ],
            rows,
        }
    }

    fn list_primary_key_columns(&self, table: &str) -> QueryOutput {
        let rows = self
            .find_table(table)
            .map(|t| {
                t.columns
                    .iter()
                    .filter(|c| c.is_primary_key)
                    .map(|c| EngineRow::new(vec![SqlValue::Text(c.name.clone())]))
                    .collect()
            })
            .unwrap_or_default();

        QueryOutput {
            fields: vec![field("attname")],
            rows,
        }
    }

    fn list_foreign_key_references(&self, table: &str) -> QueryOutput {
        let rows = self
            .find_table(table)
            .map(|t| {
                t.columns
                    .iter()
                    .filter_map(|c| {
                        c.references.as_ref().map(|(target_table, target_column)| {
                            EngineRow::new(vec![
                                SqlValue::Text(c.name.clone()),
                                SqlValue::Text(target_table.clone()),
                                SqlValue::Text(target_column.clone()),
                            ])
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        QueryOutput {
            fields: vec![field("column_name"), field("table_name"), field("column_name")],
            rows,
        }
    }

    fn list_foreign_keys(&self) -> QueryOutput {
        let mut edges: Vec<[String; 5]> = vec![];
        for table in &self.tables {
            for column in &table.columns {
                if let Some((target_table, target_column)) = &column.references {
                    edges.push([
                        format!("{}_{}_fkey", table.name, column.name),
                        table.name.clone(),
                        column.name.clone(),
                        target_table.clone(),
                        target_column.clone(),
                    ]);
                }
            }
        }

        edges.sort_by(|a, b| a[0].cmp(&b[0]));

        QueryOutput {
            fields: vec![
                field("constraint_name"),
                field("table_name"),
                field("column_name"),
                field("table_name"),
                field("column_name"),
            ],
            rows: edges
                .into_iter()
                .map(|edge| {
                    EngineRow::new(edge.into_iter().map(SqlValue::Text).collect())
                })
                .collect(),
        }
    }

    fn table_data(&self, table: &str) -> Result<QueryOutput, EngineError> {
        let table = self
            .find_table(table)
            .ok_or_else(|| EngineError::new(format!("relation \"{}\" does not exist", table)))?;

        Ok(QueryOutput {
            fields: table.columns.iter().map(|c| field(&c.name)).collect(),
            rows: table
                .rows
                .iter()
                .map(|values| EngineRow::new(values.clone()))
                .collect(),
        })
    }

    fn find_table(&self, name: &str) -> Option<&FakeTable> {
        self.tables.iter().find(|t| t.name == name)
    }
}

fn field(name: &str) -> FieldDescription {
    FieldDescription {
        name: name.to_string(),
        type_id: 0,
    }
}

fn quoted_after(sql: &str, marker: &str) -> Option<String> {
    let start = sql.find(marker)? + marker.len();
    let rest = sql[start..].strip_prefix('\'')?;
    let end = rest.find('\'')?;
    Some(rest[..end].to_string())
}

#[async_trait]
impl SqlEngine for FakeEngine {
    async fn query(&self, sql: &str) -> Result<QueryOutput, EngineError> {
        let mut inner = self.inner.lock().unwrap();
        inner.queried.push(sql.to_string());
        inner.check_failure(sql)?;
        inner.respond(sql)
    }

    async fn execute(&self, sql: &str) -> Result<(), EngineError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_failure(sql)?;
        inner.executed.push(sql.to_string());
        Ok(())
    }
}
