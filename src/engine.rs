use crate::{Result, WorkbenchError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

/// An error reported by the embedded engine. The message is kept verbatim
/// so it can be surfaced to the user unchanged.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[error("{message}")]
pub struct EngineError {
    pub message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        EngineError {
            message: message.into(),
        }
    }
}

/// A single value in a result row from the embedded engine.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl SqlValue {
    fn kind(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Bool(_) => "bool",
            SqlValue::Int(_) => "int",
            SqlValue::Float(_) => "float",
            SqlValue::Text(_) => "text",
            SqlValue::Timestamp(_) => "timestamp",
        }
    }
}

/// Description of a single column in a query result.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct FieldDescription {
    pub name: String,
    pub type_id: u32,
}

/// One row as returned by the engine.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct EngineRow {
    values: Vec<SqlValue>,
}

impl EngineRow {
    pub fn new(values: Vec<SqlValue>) -> Self {
        EngineRow { values }
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    pub fn try_get<T: FromSqlValue>(&self, index: usize) -> Result<T> {
        let value = self.values.get(index).ok_or_else(|| {
            WorkbenchError::UnexpectedRowValue {
                column_index: index,
                message: format!("row only has {} columns", self.values.len()),
            }
        })?;

        T::from_sql_value(value).ok_or_else(|| WorkbenchError::UnexpectedRowValue {
            column_index: index,
            message: format!(
                "cannot read a {} value as {}",
                value.kind(),
                std::any::type_name::<T>()
            ),
        })
    }
}

/// The complete result of a single query.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct QueryOutput {
    pub fields: Vec<FieldDescription>,
    pub rows: Vec<EngineRow>,
}

impl QueryOutput {
    pub fn empty() -> Self {
        QueryOutput {
            fields: vec![],
            rows: vec![],
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Conversion from a single engine value to a Rust value.
pub trait FromSqlValue: Sized {
    fn from_sql_value(value: &SqlValue) -> Option<Self>;
}

impl FromSqlValue for String {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Text(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromSqlValue for bool {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromSqlValue for i64 {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl FromSqlValue for i32 {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Int(i) => i32::try_from(*i).ok(),
            _ => None,
        }
    }
}

impl FromSqlValue for f64 {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Float(f) => Some(f.into_inner()),
            SqlValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl FromSqlValue for DateTime<Utc> {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Null => Some(None),
            other => T::from_sql_value(other).map(Some),
        }
    }
}

/// Conversion from a full engine row to a typed value.
pub trait FromRow: Sized {
    fn from_row(row: &EngineRow) -> Result<Self>;
}

impl<T1: FromSqlValue> FromRow for (T1,) {
    fn from_row(row: &EngineRow) -> Result<Self> {
        Ok((row.try_get(0)?,))
    }
}

impl<T1: FromSqlValue, T2: FromSqlValue> FromRow for (T1, T2) {
    fn from_row(row: &EngineRow) -> Result<Self> {
        Ok((row.try_get(0)?, row.try_get(1)?))
    }
}

impl<T1: FromSqlValue, T2: FromSqlValue, T3: FromSqlValue> FromRow for (T1, T2, T3) {
    fn from_row(row: &EngineRow) -> Result<Self> {
        Ok((row.try_get(0)?, row.try_get(1)?, row.try_get(2)?))
    }
}

/// The embedded database engine. Query execution, storage and persistence
/// all live on the other side of this trait.
#[async_trait]
pub trait SqlEngine: Send + Sync {
    async fn query(&self, sql: &str) -> std::result::Result<QueryOutput, EngineError>;

    async fn execute(&self, sql: &str) -> std::result::Result<(), EngineError>;
}

/// Wraps the engine behind a request gate. The engine is a single logical
/// connection, so statements must never be submitted concurrently; later
/// statements may depend on side effects of earlier ones.
pub struct EngineConnection {
    engine: Box<dyn SqlEngine>,
    gate: Mutex<()>,
}

impl EngineConnection {
    pub fn new(engine: impl SqlEngine + 'static) -> Self {
        EngineConnection {
            engine: Box::new(engine),
            gate: Mutex::new(()),
        }
    }

    pub async fn query(&self, sql: &str) -> Result<QueryOutput> {
        let _permit = self.gate.lock().await;
        self.engine
            .query(sql)
            .await
            .map_err(|e| WorkbenchError::EngineErrorWithQuery {
                query: sql.to_string(),
                source: e,
            })
    }

    pub async fn execute_non_query(&self, sql: &str) -> Result {
        let _permit = self.gate.lock().await;
        self.engine
            .execute(sql)
            .await
            .map_err(|e| WorkbenchError::EngineErrorWithQuery {
                query: sql.to_string(),
                source: e,
            })
    }

    pub async fn get_results<T: FromRow>(&self, sql: &str) -> Result<Vec<T>> {
        let output = self.query(sql).await?;

        let mut results = Vec::with_capacity(output.rows.len());
        for row in &output.rows {
            results.push(T::from_row(row)?);
        }

        Ok(results)
    }

    pub async fn get_result<T: FromRow>(&self, sql: &str) -> Result<T> {
        let results = self.get_results(sql).await?;
        if results.len() != 1 {
            return Err(WorkbenchError::InvalidNumberOfResults {
                actual: results.len(),
                expected: 1,
            });
        }

        // Safe, we have just checked the length of the vector
        Ok(results.into_iter().next().unwrap())
    }

    pub async fn get_single_results<T: FromSqlValue>(&self, sql: &str) -> Result<Vec<T>> {
        let results = self
            .get_results::<(T,)>(sql)
            .await?
            .into_iter()
            .map(|t| t.0)
            .collect();

        Ok(results)
    }
}
