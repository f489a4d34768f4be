use crate::activity::{AuditStamp, generate_guid};
use crate::ids::{IdAllocator, TableKind};
use crate::persistence::{ImportError, ImportResult, ProjectContext, ProjectStore};
use std::collections::HashMap;
use tracing::{debug, info};

pub const WBS_STATUS_ACTIVE: &str = "WS_Active";

/// One data row of the WBS file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WbsRow {
    pub short_name: String,
    pub name: String,
    /// Full name of the parent node, empty for the project root.
    pub parent_name: String,
}

impl WbsRow {
    pub fn new(
        short_name: impl Into<String>,
        name: impl Into<String>,
        parent_name: impl Into<String>,
    ) -> Self {
        Self {
            short_name: short_name.into(),
            name: name.into(),
            parent_name: parent_name.into(),
        }
    }
}

/// A `PROJWBS` row as inserted by the resolver. New nodes are never the
/// project node and always carry summary data.
#[derive(Debug, Clone, PartialEq)]
pub struct WbsNode {
    pub wbs_id: i64,
    pub proj_id: i64,
    /// `None` only for the project node.
    pub parent_wbs_id: Option<i64>,
    pub short_name: String,
    pub name: String,
    pub proj_node_flag: bool,
    pub sum_data_flag: bool,
    pub guid: String,
    pub audit: AuditStamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WbsOutcome {
    Cached(i64),
    Existing(i64),
    Created(i64),
}

impl WbsOutcome {
    pub fn id(&self) -> i64 {
        match *self {
            WbsOutcome::Cached(id) | WbsOutcome::Existing(id) | WbsOutcome::Created(id) => id,
        }
    }
}

/// Get-or-create for WBS nodes of a single project.
///
/// Owns two caches for the lifetime of one run: short name to id (the
/// identity key of a WBS row) and full name to id (how activities and child
/// rows refer to a node).
#[derive(Debug, Clone)]
pub struct WbsResolver {
    proj_id: i64,
    root_wbs_id: i64,
    by_short_name: HashMap<String, i64>,
    by_name: HashMap<String, i64>,
}

impl WbsResolver {
    pub fn new(project: &ProjectContext) -> Self {
        let mut by_short_name = HashMap::new();
        if !project.root_short_name.is_empty() {
            by_short_name.insert(project.root_short_name.clone(), project.root_wbs_id);
        }
        Self {
            proj_id: project.proj_id,
            root_wbs_id: project.root_wbs_id,
            by_short_name,
            by_name: HashMap::new(),
        }
    }

    pub fn root_wbs_id(&self) -> i64 {
        self.root_wbs_id
    }

    pub fn cached(&self, short_name: &str) -> Option<i64> {
        self.by_short_name.get(short_name).copied()
    }

    /// Returns `Ok(None)` for a row without a short name; the caller keeps the
    /// project root in that case. A short name without a full name is fatal.
    pub fn resolve_or_create<S: ProjectStore + ?Sized>(
        &mut self,
        store: &S,
        ids: &mut IdAllocator,
        audit: &AuditStamp,
        row: &WbsRow,
    ) -> ImportResult<Option<WbsOutcome>> {
        let short_name = row.short_name.trim();
        if short_name.is_empty() {
            return Ok(None);
        }
        let name = row.name.trim();
        if name.is_empty() {
            return Err(ImportError::UnnamedWbs(short_name.to_string()));
        }

        if let Some(id) = self.cached(short_name) {
            return Ok(Some(WbsOutcome::Cached(id)));
        }

        if let Some(id) = store.find_wbs_by_name(self.proj_id, name)? {
            debug!(short_name, wbs_id = id, "found existing WBS");
            self.remember(short_name, name, id);
            return Ok(Some(WbsOutcome::Existing(id)));
        }

        let parent_name = row.parent_name.trim();
        let parent_wbs_id = if parent_name.is_empty() {
            self.root_wbs_id
        } else {
            self.lookup(store, parent_name)?
                .ok_or_else(|| ImportError::MissingParentWbs {
                    parent: parent_name.to_string(),
                    child: short_name.to_string(),
                })?
        };

        let node = WbsNode {
            wbs_id: ids.next(TableKind::Wbs),
            proj_id: self.proj_id,
            parent_wbs_id: Some(parent_wbs_id),
            short_name: short_name.to_string(),
            name: name.to_string(),
            proj_node_flag: false,
            sum_data_flag: true,
            guid: generate_guid(),
            audit: audit.clone(),
        };
        store.insert_wbs(&node)?;
        self.remember(short_name, name, node.wbs_id);
        info!(
            short_name,
            name,
            wbs_id = node.wbs_id,
            parent_wbs_id,
            "created WBS"
        );
        Ok(Some(WbsOutcome::Created(node.wbs_id)))
    }

    /// Finds a node by its full name, without creating anything.
    pub fn lookup<S: ProjectStore + ?Sized>(
        &mut self,
        store: &S,
        name: &str,
    ) -> ImportResult<Option<i64>> {
        if let Some(id) = self.by_name.get(name) {
            return Ok(Some(*id));
        }
        let found = store.find_wbs_by_name(self.proj_id, name)?;
        if let Some(id) = found {
            self.by_name.insert(name.to_string(), id);
        }
        Ok(found)
    }

    fn remember(&mut self, short_name: &str, name: &str, id: i64) {
        self.by_short_name.insert(short_name.to_string(), id);
        self.by_name.insert(name.to_string(), id);
    }
}
