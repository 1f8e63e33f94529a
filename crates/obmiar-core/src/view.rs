//! Accumulated report output for one upload run.

use serde::Serialize;

use crate::options::ReportKind;

/// One rendered unit of the report: a server response or a failure marker.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Fragment {
    /// The endpoint answered with a body that parsed as JSON.
    Report {
        report: ReportKind,
        body: serde_json::Value,
    },
    /// The request failed or the body was not JSON.
    Failure { report: ReportKind, message: String },
}

impl Fragment {
    pub fn report_kind(&self) -> ReportKind {
        match self {
            Fragment::Report { report, .. } | Fragment::Failure { report, .. } => *report,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Fragment::Failure { .. })
    }
}

/// Ordered sink for fragments.
///
/// Fragments are appended in arrival order of the underlying requests, which
/// is unspecified relative to dispatch order. The dispatcher clears the view
/// exactly once per run, before the first request goes out, so the view only
/// ever reflects the latest run.
#[derive(Debug, Default)]
pub struct ReportView {
    fragments: Vec<Fragment>,
}

impl ReportView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything accumulated by the previous run.
    pub fn clear(&mut self) {
        self.fragments.clear();
    }

    pub fn push(&mut self, fragment: Fragment) {
        self.fragments.push(fragment);
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}
