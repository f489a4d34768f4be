use super::{ImportError, ImportResult, ProjectContext, ProjectStore};
use crate::activity::{AuditStamp, WorkItem, generate_guid};
use crate::config::ImportConfig;
use crate::ids::TableKind;
use crate::loader::{ImportBatch, Loader};
use crate::relationship::Relationship;
use crate::report::ImportReport;
use crate::wbs::{WBS_STATUS_ACTIVE, WbsNode};
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use tracing::{error, info, warn};

/// [`ProjectStore`] over a P6 Professional style SQLite database.
///
/// Borrows a connection, usually a [`Transaction`] through deref, so the
/// caller decides when to commit.
pub struct SqliteProjectStore<'c> {
    connection: &'c Connection,
}

fn flag(value: bool) -> &'static str {
    if value { "Y" } else { "N" }
}

impl<'c> SqliteProjectStore<'c> {
    pub fn new(connection: &'c Connection) -> Self {
        Self { connection }
    }

    /// Creates the tables the importer touches when they are missing. A real
    /// P6 database already has them, making this a no-op there.
    pub fn initialize_schema(connection: &Connection) -> ImportResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS PROJECT (
                proj_id INTEGER PRIMARY KEY,
                proj_short_name TEXT NOT NULL UNIQUE,
                clndr_id INTEGER,
                guid TEXT
            );
            CREATE TABLE IF NOT EXISTS PROJWBS (
                wbs_id INTEGER PRIMARY KEY,
                proj_id INTEGER NOT NULL REFERENCES PROJECT(proj_id),
                parent_wbs_id INTEGER REFERENCES PROJWBS(wbs_id),
                wbs_short_name TEXT NOT NULL,
                wbs_name TEXT NOT NULL,
                proj_node_flag TEXT NOT NULL DEFAULT 'N',
                sum_data_flag TEXT NOT NULL DEFAULT 'N',
                status_code TEXT,
                guid TEXT,
                create_date TEXT,
                create_user TEXT,
                update_date TEXT,
                update_user TEXT
            );
            CREATE TABLE IF NOT EXISTS TASK (
                task_id INTEGER PRIMARY KEY,
                proj_id INTEGER NOT NULL REFERENCES PROJECT(proj_id),
                wbs_id INTEGER NOT NULL REFERENCES PROJWBS(wbs_id),
                clndr_id INTEGER,
                task_code TEXT NOT NULL,
                task_name TEXT,
                status_code TEXT,
                task_type TEXT,
                duration_type TEXT,
                complete_pct_type TEXT,
                target_drtn_hr_cnt REAL,
                remain_drtn_hr_cnt REAL,
                auto_compute_act_flag TEXT,
                guid TEXT,
                create_date TEXT,
                create_user TEXT,
                update_date TEXT,
                update_user TEXT,
                UNIQUE (proj_id, task_code)
            );
            CREATE TABLE IF NOT EXISTS TASKPRED (
                task_pred_id INTEGER PRIMARY KEY,
                task_id INTEGER NOT NULL REFERENCES TASK(task_id),
                pred_task_id INTEGER NOT NULL REFERENCES TASK(task_id),
                proj_id INTEGER NOT NULL,
                pred_proj_id INTEGER NOT NULL,
                pred_type TEXT NOT NULL,
                lag_hr_cnt REAL NOT NULL DEFAULT 0,
                create_date TEXT,
                create_user TEXT,
                update_date TEXT,
                update_user TEXT
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    /// Inserts a project with its root WBS node, the way P6 lays out a new project.
    pub fn create_project(
        connection: &Connection,
        project_code: &str,
        root_name: &str,
        clndr_id: Option<i64>,
        audit: &AuditStamp,
    ) -> ImportResult<ProjectContext> {
        let proj_id: i64 = connection.query_row(
            "SELECT COALESCE(MAX(proj_id), 0) + 1 FROM PROJECT",
            [],
            |row| row.get(0),
        )?;
        connection.execute(
            "INSERT INTO PROJECT (proj_id, proj_short_name, clndr_id, guid) VALUES (?1, ?2, ?3, ?4)",
            params![proj_id, project_code, clndr_id, generate_guid()],
        )?;
        let root_wbs_id: i64 = connection.query_row(
            "SELECT COALESCE(MAX(wbs_id), 0) + 1 FROM PROJWBS",
            [],
            |row| row.get(0),
        )?;
        let root = WbsNode {
            wbs_id: root_wbs_id,
            proj_id,
            parent_wbs_id: None,
            short_name: project_code.to_string(),
            name: root_name.to_string(),
            proj_node_flag: true,
            sum_data_flag: true,
            guid: generate_guid(),
            audit: audit.clone(),
        };
        SqliteProjectStore::new(connection).insert_wbs_row(&root)?;
        Ok(ProjectContext {
            proj_id,
            project_code: project_code.to_string(),
            root_wbs_id,
            root_short_name: root.short_name,
            clndr_id,
        })
    }

    fn insert_wbs_row(&self, node: &WbsNode) -> ImportResult<()> {
        let stamp = node.audit.timestamp();
        self.connection.execute(
            "INSERT INTO PROJWBS (
                wbs_id, proj_id, parent_wbs_id, wbs_short_name, wbs_name,
                proj_node_flag, sum_data_flag, status_code, guid,
                create_date, create_user, update_date, update_user
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                node.wbs_id,
                node.proj_id,
                node.parent_wbs_id,
                node.short_name,
                node.name,
                flag(node.proj_node_flag),
                flag(node.sum_data_flag),
                WBS_STATUS_ACTIVE,
                node.guid,
                stamp,
                node.audit.user,
                stamp,
                node.audit.user,
            ],
        )?;
        Ok(())
    }
}

impl ProjectStore for SqliteProjectStore<'_> {
    fn project_context(&self, project_code: &str) -> ImportResult<ProjectContext> {
        let project: Option<(i64, Option<i64>)> = self
            .connection
            .query_row(
                "SELECT proj_id, clndr_id FROM PROJECT WHERE proj_short_name = ?1",
                params![project_code],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((proj_id, clndr_id)) = project else {
            return Err(ImportError::ProjectNotFound(project_code.to_string()));
        };

        let root: Option<(i64, String)> = self
            .connection
            .query_row(
                "SELECT wbs_id, wbs_short_name FROM PROJWBS
                 WHERE proj_id = ?1 AND proj_node_flag = 'Y'
                 ORDER BY wbs_id ASC LIMIT 1",
                params![proj_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((root_wbs_id, root_short_name)) = root else {
            return Err(ImportError::RootWbsMissing(project_code.to_string()));
        };

        Ok(ProjectContext {
            proj_id,
            project_code: project_code.to_string(),
            root_wbs_id,
            root_short_name,
            clndr_id,
        })
    }

    fn max_id(&self, table: TableKind) -> ImportResult<Option<i64>> {
        let sql = format!(
            "SELECT MAX({}) FROM {}",
            table.id_column(),
            table.table_name()
        );
        let max: Option<i64> = self.connection.query_row(&sql, [], |row| row.get(0))?;
        Ok(max)
    }

    fn find_wbs_by_name(&self, proj_id: i64, wbs_name: &str) -> ImportResult<Option<i64>> {
        let id = self
            .connection
            .query_row(
                "SELECT wbs_id FROM PROJWBS WHERE proj_id = ?1 AND wbs_name = ?2
                 ORDER BY wbs_id ASC LIMIT 1",
                params![proj_id, wbs_name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn find_task_by_code(&self, proj_id: i64, task_code: &str) -> ImportResult<Option<i64>> {
        let id = self
            .connection
            .query_row(
                "SELECT task_id FROM TASK WHERE proj_id = ?1 AND task_code = ?2",
                params![proj_id, task_code],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn insert_wbs(&self, node: &WbsNode) -> ImportResult<()> {
        self.insert_wbs_row(node)
    }

    fn insert_task(&self, item: &WorkItem) -> ImportResult<()> {
        let stamp = item.audit.timestamp();
        self.connection.execute(
            "INSERT INTO TASK (
                task_id, proj_id, wbs_id, clndr_id, task_code, task_name,
                status_code, task_type, duration_type, complete_pct_type,
                target_drtn_hr_cnt, remain_drtn_hr_cnt,
                auto_compute_act_flag, guid,
                create_date, create_user, update_date, update_user
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
            params![
                item.task_id,
                item.proj_id,
                item.wbs_id,
                item.clndr_id,
                item.task_code,
                item.task_name,
                item.status_code(),
                item.task_type(),
                item.duration_type(),
                item.complete_pct_type(),
                item.duration_hours,
                item.duration_hours,
                flag(true),
                item.guid,
                stamp,
                item.audit.user,
                stamp,
                item.audit.user,
            ],
        )?;
        Ok(())
    }

    fn insert_relationship(&self, edge: &Relationship) -> ImportResult<()> {
        let stamp = edge.audit.timestamp();
        self.connection.execute(
            "INSERT INTO TASKPRED (
                task_pred_id, task_id, pred_task_id, proj_id, pred_proj_id,
                pred_type, lag_hr_cnt, create_date, create_user, update_date, update_user
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                edge.task_pred_id,
                edge.task_id,
                edge.pred_task_id,
                edge.proj_id,
                edge.pred_proj_id,
                edge.relation.p6_code(),
                edge.lag_hours,
                stamp,
                edge.audit.user,
                stamp,
                edge.audit.user,
            ],
        )?;
        Ok(())
    }
}

/// Runs `work` inside one transaction: commit on `Ok`, roll back on `Err`.
pub fn run_in_transaction<T, F>(connection: &mut Connection, work: F) -> ImportResult<T>
where
    F: FnOnce(&Transaction<'_>) -> ImportResult<T>,
{
    let tx = connection.transaction()?;
    match work(&tx) {
        Ok(value) => {
            tx.commit()?;
            Ok(value)
        }
        Err(err) => {
            warn!(error = %err, "rolling back all changes");
            if let Err(rollback) = tx.rollback() {
                error!(error = %rollback, "rollback failed");
            }
            Err(err)
        }
    }
}

pub fn import_batch(
    connection: &mut Connection,
    config: &ImportConfig,
    batch: &ImportBatch,
) -> ImportResult<ImportReport> {
    let report = run_in_transaction(connection, |tx| {
        let store = SqliteProjectStore::new(tx);
        Loader::new(&store, config)?.run(batch)
    })?;
    info!("all changes committed");
    Ok(report)
}
