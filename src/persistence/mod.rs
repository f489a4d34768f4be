use crate::activity::WorkItem;
use crate::ids::TableKind;
use crate::relationship::Relationship;
use crate::wbs::WbsNode;
use serde_json::Error as SerdeJsonError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal failures. Any of these aborts the run and rolls back the transaction.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("config error: {0}")]
    Json(#[from] SerdeJsonError),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("'{}' is missing required columns: {}", file.display(), columns.join(", "))]
    MissingColumns { file: PathBuf, columns: Vec<String> },
    #[error("row {row} of '{}': {message}", file.display())]
    InvalidRow {
        file: PathBuf,
        row: usize,
        message: String,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("project '{0}' not found")]
    ProjectNotFound(String),
    #[error("project '{0}' has no root WBS node (proj_node_flag = 'Y')")]
    RootWbsMissing(String),
    #[error(
        "could not find parent WBS with name '{parent}' for WBS '{child}'; parent rows must appear before child rows"
    )]
    MissingParentWbs { parent: String, child: String },
    #[error("WBS '{0}' has no full name")]
    UnnamedWbs(String),
    #[error(
        "WBS name '{wbs_name}' for activity '{activity}' not found in the project's WBS structure"
    )]
    UnknownWbs { wbs_name: String, activity: String },
    #[error("could not read current maximum id of {table}: {source}")]
    AllocatorSeed {
        table: &'static str,
        #[source]
        source: Box<ImportError>,
    },
}

pub type ImportResult<T> = Result<T, ImportError>;

/// Identity of the project every row in a run is loaded into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectContext {
    pub proj_id: i64,
    pub project_code: String,
    pub root_wbs_id: i64,
    pub root_short_name: String,
    pub clndr_id: Option<i64>,
}

/// The slice of the scheduling database the loader reads and writes.
///
/// Implementations are expected to run inside a transaction owned by the
/// caller; nothing here commits.
pub trait ProjectStore {
    fn project_context(&self, project_code: &str) -> ImportResult<ProjectContext>;
    fn max_id(&self, table: TableKind) -> ImportResult<Option<i64>>;
    fn find_wbs_by_name(&self, proj_id: i64, wbs_name: &str) -> ImportResult<Option<i64>>;
    fn find_task_by_code(&self, proj_id: i64, task_code: &str) -> ImportResult<Option<i64>>;
    fn insert_wbs(&self, node: &WbsNode) -> ImportResult<()>;
    fn insert_task(&self, item: &WorkItem) -> ImportResult<()>;
    fn insert_relationship(&self, edge: &Relationship) -> ImportResult<()>;
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{read_activity_csv, read_wbs_csv};
