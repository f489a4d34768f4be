use chrono::{Local, NaiveDateTime};
use uuid::Uuid;

pub const STATUS_NOT_STARTED: &str = "TK_NotStart";
pub const TASK_TYPE_TASK_DEPENDENT: &str = "TT_Task";
pub const DURATION_TYPE_FIXED: &str = "DT_FixedDur";
pub const PERCENT_COMPLETE_DURATION: &str = "CP_Drtn";

const AUDIT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Create/update audit columns shared by every row written in one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditStamp {
    pub at: NaiveDateTime,
    pub user: String,
}

impl AuditStamp {
    pub fn new(at: NaiveDateTime, user: impl Into<String>) -> Self {
        Self {
            at,
            user: user.into(),
        }
    }

    pub fn now(user: impl Into<String>) -> Self {
        Self::new(Local::now().naive_local(), user)
    }

    pub fn timestamp(&self) -> String {
        self.at.format(AUDIT_FORMAT).to_string()
    }
}

pub fn generate_guid() -> String {
    Uuid::new_v4().to_string()
}

/// One data row of the activity file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActivityRow {
    pub activity_id: String,
    pub activity_name: String,
    pub duration_days: f64,
    /// Full name of the owning WBS node, empty for the project root.
    pub wbs_name: String,
    pub predecessors: String,
}

impl ActivityRow {
    pub fn new(
        activity_id: impl Into<String>,
        activity_name: impl Into<String>,
        duration_days: f64,
    ) -> Self {
        Self {
            activity_id: activity_id.into(),
            activity_name: activity_name.into(),
            duration_days,
            ..Self::default()
        }
    }

    pub fn with_wbs(mut self, wbs_name: impl Into<String>) -> Self {
        self.wbs_name = wbs_name.into();
        self
    }

    pub fn with_predecessors(mut self, predecessors: impl Into<String>) -> Self {
        self.predecessors = predecessors.into();
        self
    }
}

/// A `TASK` row as inserted by the loader.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem {
    pub task_id: i64,
    pub proj_id: i64,
    pub wbs_id: i64,
    pub clndr_id: Option<i64>,
    pub task_code: String,
    pub task_name: String,
    pub duration_hours: f64,
    pub guid: String,
    pub audit: AuditStamp,
}

impl WorkItem {
    pub fn status_code(&self) -> &'static str {
        STATUS_NOT_STARTED
    }

    pub fn task_type(&self) -> &'static str {
        TASK_TYPE_TASK_DEPENDENT
    }

    pub fn duration_type(&self) -> &'static str {
        DURATION_TYPE_FIXED
    }

    pub fn complete_pct_type(&self) -> &'static str {
        PERCENT_COMPLETE_DURATION
    }
}
