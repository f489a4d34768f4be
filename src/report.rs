use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    DuplicateCode,
    ExistingActivity,
    MissingSuccessor,
    MalformedLink,
    UnresolvedPredecessor,
}

impl DiagnosticKind {
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::DuplicateCode
            | DiagnosticKind::ExistingActivity
            | DiagnosticKind::MissingSuccessor => Severity::Warning,
            DiagnosticKind::MalformedLink | DiagnosticKind::UnresolvedPredecessor => {
                Severity::Error
            }
        }
    }
}

/// A skipped row or dropped link. Never changes control flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// 1-based data row in the activity file.
    pub row: usize,
    pub message: String,
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity() {
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        };
        write!(f, "{label} (row {}): {}", self.row, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub wbs_created: usize,
    pub wbs_reused: usize,
    pub activities_inserted: usize,
    pub activities_existing: usize,
    pub relationships_inserted: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl ImportReport {
    pub(crate) fn push(&mut self, kind: DiagnosticKind, row: usize, message: String) {
        self.diagnostics.push(Diagnostic { kind, row, message });
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity() == Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity() == Severity::Error)
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }

    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        if self.wbs_created > 0 || self.wbs_reused > 0 {
            parts.push(format!("wbs_created={}", self.wbs_created));
            parts.push(format!("wbs_reused={}", self.wbs_reused));
        }
        parts.push(format!("activities={}", self.activities_inserted));
        if self.activities_existing > 0 {
            parts.push(format!("existing={}", self.activities_existing));
        }
        parts.push(format!("relationships={}", self.relationships_inserted));
        let warnings = self.warnings().count();
        if warnings > 0 {
            parts.push(format!("warnings={warnings}"));
        }
        let errors = self.errors().count();
        if errors > 0 {
            parts.push(format!("dropped_links={errors}"));
        }
        parts.join(", ")
    }
}
