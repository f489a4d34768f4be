pub mod activity;
pub mod config;
pub mod ids;
pub mod loader;
pub mod persistence;
pub mod relationship;
pub mod report;
pub mod wbs;

pub use activity::{ActivityRow, AuditStamp, WorkItem};
pub use config::{DEFAULT_HOURS_PER_DAY, ImportConfig};
pub use ids::{IdAllocator, TableKind};
pub use loader::{ImportBatch, Loader};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::{SqliteProjectStore, import_batch, run_in_transaction};
pub use persistence::{
    ImportError, ImportResult, ProjectContext, ProjectStore, read_activity_csv, read_wbs_csv,
};
pub use relationship::{
    Lag, LagUnit, PredecessorLink, RelationType, Relationship, RelationshipError,
    parse_predecessor, parse_predecessor_list,
};
pub use report::{Diagnostic, DiagnosticKind, ImportReport, Severity};
pub use wbs::{WbsNode, WbsOutcome, WbsResolver, WbsRow};
