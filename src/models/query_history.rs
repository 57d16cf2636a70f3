use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct QueryHistoryItem {
    pub id: Uuid,
    pub query: String,
    pub executed_at: DateTime<Utc>,
    pub success: bool,
    pub row_count: Option<usize>,
    pub error: Option<String>,
}

/// Append-only log of executed queries, capped at a fixed capacity. When
/// full, the oldest entry is evicted first.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct QueryHistory {
    items: VecDeque<QueryHistoryItem>,
    capacity: usize,
}

impl QueryHistory {
    pub fn new(capacity: usize) -> Self {
        QueryHistory {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, item: QueryHistoryItem) {
        while self.items.len() >= self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    /// Entries in execution order, oldest first.
    pub fn items(&self) -> impl Iterator<Item = &QueryHistoryItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for QueryHistory {
    fn default() -> Self {
        QueryHistory::new(DEFAULT_HISTORY_CAPACITY)
    }
}
