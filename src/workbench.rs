use crate::dependency_sort::sort_tables_by_dependency;
use crate::engine::{EngineConnection, QueryOutput, SqlEngine};
use crate::models::{QueryHistory, QueryHistoryItem, SchemaSnapshot};
use crate::schema_reader::SchemaReader;
use crate::sql_export::{SqlExport, SqlExportOptions, SqlExporter};
use crate::sql_import::{ImportSummary, SqlImporter};
use crate::Result;
use chrono::Utc;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{instrument, warn};
use uuid::Uuid;

/// The orchestration layer the UI talks to. Owns the engine connection,
/// the current schema snapshot and the query history.
///
/// The snapshot is replaced wholesale on refresh and handed out as a
/// shared, immutable value; consumers never observe a half-built schema.
pub struct Workbench {
    connection: EngineConnection,
    current_snapshot: RwLock<Option<Arc<SchemaSnapshot>>>,
    refresh_gate: tokio::sync::Mutex<()>,
    history: Mutex<QueryHistory>,
}

impl Workbench {
    pub fn new(engine: impl SqlEngine + 'static) -> Self {
        Workbench {
            connection: EngineConnection::new(engine),
            current_snapshot: RwLock::new(None),
            refresh_gate: tokio::sync::Mutex::new(()),
            history: Mutex::new(QueryHistory::default()),
        }
    }

    pub fn connection(&self) -> &EngineConnection {
        &self.connection
    }

    /// The last good schema snapshot, if any refresh has succeeded yet.
    pub fn current_snapshot(&self) -> Option<Arc<SchemaSnapshot>> {
        self.current_snapshot.read().unwrap().clone()
    }

    /// Rebuilds the schema snapshot from the catalog. Refreshes are
    /// serialized; on failure the previously published snapshot stays in
    /// place and the error is returned to the caller.
    #[instrument(skip_all)]
    pub async fn refresh_schema(&self) -> Result<Arc<SchemaSnapshot>> {
        let _refresh = self.refresh_gate.lock().await;

        let reader = SchemaReader::new(&self.connection);
        let snapshot = Arc::new(reader.introspect_schema().await?);

        *self.current_snapshot.write().unwrap() = Some(snapshot.clone());

        Ok(snapshot)
    }

    /// Runs a single statement from the editor and records it in the query
    /// history. The result is propagated as-is so the caller decides how to
    /// surface a failure.
    pub async fn run_query(&self, sql: &str) -> Result<QueryOutput> {
        let result = self.connection.query(sql).await;

        let item = QueryHistoryItem {
            id: Uuid::new_v4(),
            query: sql.to_string(),
            executed_at: Utc::now(),
            success: result.is_ok(),
            row_count: result.as_ref().ok().map(|o| o.row_count()),
            error: result.as_ref().err().map(|e| e.engine_message()),
        };
        self.history.lock().unwrap().push(item);

        result
    }

    /// Replays an imported .sql/.txt file and refreshes the catalog
    /// afterwards, no matter how many statements failed.
    pub async fn import_sql(&self, raw_sql: &str) -> ImportSummary {
        let importer = SqlImporter::new(&self.connection);
        let summary = importer.import_sql(raw_sql).await;

        if let Err(e) = self.refresh_schema().await {
            warn!("Schema refresh after import failed: {}", e);
        }

        summary
    }

    /// Generates the downloadable SQL export for the current schema,
    /// refreshing first if no snapshot has been published yet.
    pub async fn export_sql(&self, options: &SqlExportOptions) -> Result<SqlExport> {
        let snapshot = match self.current_snapshot() {
            Some(snapshot) => snapshot,
            None => self.refresh_schema().await?,
        };

        let exporter = SqlExporter::new(&self.connection);
        exporter.export_database(&snapshot, options).await
    }

    /// Drops every table, dependents first, then refreshes.
    #[instrument(skip_all)]
    pub async fn clear_database(&self) -> Result {
        let snapshot = match self.current_snapshot() {
            Some(snapshot) => snapshot,
            None => self.refresh_schema().await?,
        };

        let ordered = sort_tables_by_dependency(&snapshot.tables, &snapshot.foreign_keys);
        for table in ordered.iter().rev() {
            self.connection
                .execute_non_query(&table.get_drop_statement())
                .await?;
        }

        self.refresh_schema().await?;

        Ok(())
    }

    /// Query history entries in execution order, oldest first.
    pub fn history(&self) -> Vec<QueryHistoryItem> {
        self.history.lock().unwrap().items().cloned().collect()
    }
}
