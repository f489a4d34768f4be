use crate::persistence::{ImportError, ImportResult, ProjectStore};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Wbs,
    Task,
    TaskPred,
}

impl TableKind {
    pub const ALL: [TableKind; 3] = [TableKind::Wbs, TableKind::Task, TableKind::TaskPred];

    pub fn table_name(self) -> &'static str {
        match self {
            TableKind::Wbs => "PROJWBS",
            TableKind::Task => "TASK",
            TableKind::TaskPred => "TASKPRED",
        }
    }

    pub fn id_column(self) -> &'static str {
        match self {
            TableKind::Wbs => "wbs_id",
            TableKind::Task => "task_id",
            TableKind::TaskPred => "task_pred_id",
        }
    }
}

/// Hands out surrogate keys per table for one run.
///
/// Counters start one past the largest id already stored, so ids handed out
/// here never collide with committed rows. An id is never handed out twice,
/// even when the row it was meant for ends up skipped.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: HashMap<TableKind, i64>,
}

impl IdAllocator {
    pub fn seed<S: ProjectStore + ?Sized>(store: &S) -> ImportResult<Self> {
        let mut next = HashMap::with_capacity(TableKind::ALL.len());
        for kind in TableKind::ALL {
            let max = store
                .max_id(kind)
                .map_err(|err| ImportError::AllocatorSeed {
                    table: kind.table_name(),
                    source: Box::new(err),
                })?;
            next.insert(kind, max.unwrap_or(0) + 1);
        }
        Ok(Self { next })
    }

    pub fn from_maxima<I>(maxima: I) -> Self
    where
        I: IntoIterator<Item = (TableKind, i64)>,
    {
        let mut next: HashMap<TableKind, i64> =
            TableKind::ALL.iter().map(|kind| (*kind, 1)).collect();
        for (kind, max) in maxima {
            next.insert(kind, max + 1);
        }
        Self { next }
    }

    pub fn next(&mut self, kind: TableKind) -> i64 {
        let slot = self.next.entry(kind).or_insert(1);
        let id = *slot;
        *slot += 1;
        id
    }
}
