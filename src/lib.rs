#[cfg(test)]
mod test_helpers;

mod dependency_sort;
mod engine;
mod error;
mod models;
mod quoting;
mod schema_reader;
mod sql_export;
mod sql_import;
mod statement_splitter;
mod ui_state;
mod workbench;

pub use dependency_sort::*;
pub use engine::*;
pub use error::*;
pub use models::*;
pub use schema_reader::*;
pub use sql_export::*;
pub use sql_import::*;
pub use statement_splitter::*;
pub use ui_state::*;
pub use workbench::*;
