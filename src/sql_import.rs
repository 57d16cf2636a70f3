use crate::engine::EngineConnection;
use crate::statement_splitter::split_statements;
use tracing::{instrument, warn};

/// One statement that failed during an import, with the engine's message
/// kept verbatim.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct StatementFailure {
    pub statement: String,
    pub message: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct ImportSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<StatementFailure>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ImportStatus {
    Complete,
    Degraded,
}

impl ImportSummary {
    pub fn status(&self) -> ImportStatus {
        if self.failed == 0 {
            ImportStatus::Complete
        } else {
            ImportStatus::Degraded
        }
    }
}

/// Replays a multi-statement SQL text against the engine, one statement at
/// a time. A failing statement is recorded and skipped, never aborting the
/// rest of the batch.
pub struct SqlImporter<'a> {
    connection: &'a EngineConnection,
}

impl SqlImporter<'_> {
    pub fn new(connection: &EngineConnection) -> SqlImporter {
        SqlImporter { connection }
    }

    /// Statements run strictly sequentially; later statements may depend on
    /// schema changes made by earlier ones.
    #[instrument(skip_all)]
    pub async fn import_sql(&self, raw_sql: &str) -> ImportSummary {
        let mut summary = ImportSummary::default();

        for statement in split_statements(raw_sql) {
            match self.connection.execute_non_query(&statement).await {
                Ok(()) => summary.succeeded += 1,
                Err(e) => {
                    let message = e.engine_message();
                    warn!("Statement failed during import: {}", message);
                    summary.failed += 1;
                    summary.failures.push(StatementFailure { statement, message });
                }
            }
        }

        summary
    }
}
