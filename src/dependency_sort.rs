use crate::models::{ForeignKey, Table};
use std::collections::{HashMap, HashSet};

/// Orders tables so that every table referenced through a foreign key comes
/// before the tables referencing it, whenever such an ordering exists.
///
/// Works by repeated placement passes over the remaining tables: a table is
/// placed once all of its non-self foreign-key targets have been placed.
/// The pass count is bounded, and anything still unplaced when the bound is
/// reached (mutually referential tables) is appended in its original
/// relative order. The sort never fails.
pub fn sort_tables_by_dependency<'a>(
    tables: &'a [Table],
    foreign_keys: &[ForeignKey],
) -> Vec<&'a Table> {
    let mut targets_by_table: HashMap<&str, Vec<&str>> = HashMap::new();
    for fk in foreign_keys {
        if fk.is_self_reference() {
            continue;
        }
        targets_by_table
            .entry(fk.source_table.as_str())
            .or_default()
            .push(fk.target_table.as_str());
    }

    let mut placed: Vec<&Table> = Vec::with_capacity(tables.len());
    let mut placed_names: HashSet<&str> = HashSet::with_capacity(tables.len());
    let mut remaining: Vec<&Table> = tables.iter().collect();

    let max_passes = tables.len() * 2;
    for _ in 0..max_passes {
        if remaining.is_empty() {
            break;
        }

        let before = remaining.len();

        remaining.retain(|table| {
            let ready = targets_by_table
                .get(table.name.as_str())
                .map(|targets| targets.iter().all(|t| placed_names.contains(t)))
                .unwrap_or(true);

            if ready {
                placed_names.insert(table.name.as_str());
                placed.push(*table);
            }

            !ready
        });

        if remaining.len() == before {
            break;
        }
    }

    // Cycles degrade to best effort, keeping the original relative order.
    placed.extend(remaining);

    placed
}
