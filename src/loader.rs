use crate::activity::{ActivityRow, AuditStamp, WorkItem, generate_guid};
use crate::config::ImportConfig;
use crate::ids::{IdAllocator, TableKind};
use crate::persistence::{ImportError, ImportResult, ProjectContext, ProjectStore};
use crate::relationship::{Relationship, parse_predecessor_list};
use crate::report::{DiagnosticKind, ImportReport};
use crate::wbs::{WbsOutcome, WbsResolver, WbsRow};
use std::collections::{HashMap, HashSet};
use tracing::{debug, error, info, warn};

/// Rows for one run. Either list may be empty.
#[derive(Debug, Clone, Default)]
pub struct ImportBatch {
    pub wbs: Vec<WbsRow>,
    pub activities: Vec<ActivityRow>,
}

impl ImportBatch {
    pub fn wbs(rows: Vec<WbsRow>) -> Self {
        Self {
            wbs: rows,
            activities: Vec::new(),
        }
    }

    pub fn activities(rows: Vec<ActivityRow>) -> Self {
        Self {
            wbs: Vec::new(),
            activities: rows,
        }
    }
}

/// Loads a batch into one project.
///
/// Phases run strictly in order: WBS rows, then every activity, then every
/// relationship. Relationships are only wired once all activities are mapped,
/// so a predecessor may appear later in the file than its successor.
///
/// The loader never commits. Run it inside a transaction and roll back when
/// [`Loader::run`] returns `Err`.
pub struct Loader<'s, S: ProjectStore + ?Sized> {
    store: &'s S,
    hours_per_day: f64,
    project: ProjectContext,
    ids: IdAllocator,
    wbs: WbsResolver,
    activity_ids: HashMap<String, i64>,
    audit: AuditStamp,
    report: ImportReport,
}

impl<'s, S: ProjectStore + ?Sized> Loader<'s, S> {
    pub fn new(store: &'s S, config: &ImportConfig) -> ImportResult<Self> {
        config.validate()?;
        let project = store.project_context(config.project_code.trim())?;
        let ids = IdAllocator::seed(store)?;
        let wbs = WbsResolver::new(&project);
        info!(
            project = %project.project_code,
            proj_id = project.proj_id,
            root_wbs_id = project.root_wbs_id,
            "loader ready"
        );
        Ok(Self {
            store,
            hours_per_day: config.hours_per_day,
            project,
            ids,
            wbs,
            activity_ids: HashMap::new(),
            audit: AuditStamp::now(config.user_name.trim()),
            report: ImportReport::default(),
        })
    }

    pub fn run(mut self, batch: &ImportBatch) -> ImportResult<ImportReport> {
        self.load_wbs(&batch.wbs)?;
        let duplicates = self.load_activities(&batch.activities)?;
        self.load_relationships(&batch.activities, &duplicates)?;
        info!(summary = %self.report.to_cli_summary(), "import finished");
        Ok(self.report)
    }

    fn load_wbs(&mut self, rows: &[WbsRow]) -> ImportResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        info!(rows = rows.len(), "processing WBS hierarchy");
        for (idx, row) in rows.iter().enumerate() {
            match self
                .wbs
                .resolve_or_create(self.store, &mut self.ids, &self.audit, row)?
            {
                Some(WbsOutcome::Created(_)) => self.report.wbs_created += 1,
                Some(WbsOutcome::Existing(_) | WbsOutcome::Cached(_)) => {
                    self.report.wbs_reused += 1
                }
                None => debug!(row = idx + 1, "WBS row without short name ignored"),
            }
        }
        Ok(())
    }

    /// Returns the indices of rows skipped as in-file duplicates.
    fn load_activities(&mut self, rows: &[ActivityRow]) -> ImportResult<HashSet<usize>> {
        let mut duplicates = HashSet::new();
        if rows.is_empty() {
            return Ok(duplicates);
        }
        info!(rows = rows.len(), "pass 1: inserting activities");

        for (idx, row) in rows.iter().enumerate() {
            let row_no = idx + 1;
            let code = row.activity_id.trim();
            let wbs_id = self.placement(row)?;

            if self.activity_ids.contains_key(code) {
                let message = format!("duplicate activity id '{code}' in input; skipping");
                warn!(row = row_no, code, "{message}");
                self.report
                    .push(DiagnosticKind::DuplicateCode, row_no, message);
                duplicates.insert(idx);
                continue;
            }

            if let Some(existing) = self.store.find_task_by_code(self.project.proj_id, code)? {
                let message = format!(
                    "activity code '{code}' already exists (task_id {existing}); skipping insertion, mapping for relationships"
                );
                warn!(row = row_no, code, "{message}");
                self.report
                    .push(DiagnosticKind::ExistingActivity, row_no, message);
                self.report.activities_existing += 1;
                self.activity_ids.insert(code.to_string(), existing);
                continue;
            }

            let item = WorkItem {
                task_id: self.ids.next(TableKind::Task),
                proj_id: self.project.proj_id,
                wbs_id,
                clndr_id: self.project.clndr_id,
                task_code: code.to_string(),
                task_name: row.activity_name.trim().to_string(),
                duration_hours: row.duration_days * self.hours_per_day,
                guid: generate_guid(),
                audit: self.audit.clone(),
            };
            self.store.insert_task(&item)?;
            debug!(code, task_id = item.task_id, wbs_id, "queued activity");
            self.activity_ids.insert(item.task_code, item.task_id);
            self.report.activities_inserted += 1;
        }
        Ok(duplicates)
    }

    fn placement(&mut self, row: &ActivityRow) -> ImportResult<i64> {
        let wbs_name = row.wbs_name.trim();
        if wbs_name.is_empty() {
            return Ok(self.wbs.root_wbs_id());
        }
        self.wbs
            .lookup(self.store, wbs_name)?
            .ok_or_else(|| ImportError::UnknownWbs {
                wbs_name: wbs_name.to_string(),
                activity: row.activity_id.trim().to_string(),
            })
    }

    fn load_relationships(
        &mut self,
        rows: &[ActivityRow],
        duplicates: &HashSet<usize>,
    ) -> ImportResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        info!("pass 2: inserting relationships");

        for (idx, row) in rows.iter().enumerate() {
            let field = row.predecessors.trim();
            if field.is_empty() || duplicates.contains(&idx) {
                continue;
            }
            let row_no = idx + 1;
            let successor = row.activity_id.trim();
            let Some(&task_id) = self.activity_ids.get(successor) else {
                let message =
                    format!("successor '{successor}' was not mapped; skipping its relationships");
                warn!(row = row_no, successor, "{message}");
                self.report
                    .push(DiagnosticKind::MissingSuccessor, row_no, message);
                continue;
            };

            for (token, parsed) in parse_predecessor_list(field) {
                let link = match parsed {
                    Ok(link) => link,
                    Err(err) => {
                        let message = format!(
                            "could not parse relationship '{token}' for '{successor}': {err}"
                        );
                        error!(row = row_no, successor, "{message}");
                        self.report
                            .push(DiagnosticKind::MalformedLink, row_no, message);
                        continue;
                    }
                };

                let Some(pred_task_id) = self.resolve_activity(&link.code)? else {
                    let message = format!(
                        "predecessor '{}' for '{successor}' not found in input or database; skipping link",
                        link.code
                    );
                    error!(row = row_no, successor, "{message}");
                    self.report
                        .push(DiagnosticKind::UnresolvedPredecessor, row_no, message);
                    continue;
                };

                let edge = Relationship {
                    task_pred_id: self.ids.next(TableKind::TaskPred),
                    task_id,
                    pred_task_id,
                    proj_id: self.project.proj_id,
                    pred_proj_id: self.project.proj_id,
                    relation: link.relation,
                    lag_hours: link.lag.to_hours(self.hours_per_day),
                    audit: self.audit.clone(),
                };
                self.store.insert_relationship(&edge)?;
                debug!(
                    predecessor = %link.code,
                    successor,
                    kind = link.relation.as_str(),
                    lag_hours = edge.lag_hours,
                    "queued link"
                );
                self.report.relationships_inserted += 1;
            }
        }
        Ok(())
    }

    /// Identifier map first, then the project's existing activities.
    fn resolve_activity(&mut self, code: &str) -> ImportResult<Option<i64>> {
        if let Some(id) = self.activity_ids.get(code) {
            return Ok(Some(*id));
        }
        let found = self.store.find_task_by_code(self.project.proj_id, code)?;
        if let Some(id) = found {
            self.activity_ids.insert(code.to_string(), id);
        }
        Ok(found)
    }
}
