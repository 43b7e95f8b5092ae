//! Per-run record of what the pipeline did.

use std::fmt;

use proofpix_index::{AddOutcome, SearchHits};

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Fetch,
    Analyze,
    Parse,
    IndexUpdate,
    Commit,
    Certify,
    LogAppend,
    LogRecord,
    Badge,
}

impl Stage {
    pub const ALL: [Stage; 9] = [
        Stage::Fetch,
        Stage::Analyze,
        Stage::Parse,
        Stage::IndexUpdate,
        Stage::Commit,
        Stage::Certify,
        Stage::LogAppend,
        Stage::LogRecord,
        Stage::Badge,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Fetch => "fetch",
            Stage::Analyze => "analyze",
            Stage::Parse => "parse",
            Stage::IndexUpdate => "index_update",
            Stage::Commit => "commit",
            Stage::Certify => "certify",
            Stage::LogAppend => "log_append",
            Stage::LogRecord => "log_record",
            Stage::Badge => "badge",
        }
    }

    fn position(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    Succeeded,
    Failed(String),
    Skipped,
}

impl StageStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// How far an asset got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The asset record was written. Later stages may still have failed.
    Completed,
    /// The upload could not be read.
    FetchFailed,
    /// Analysis or embedding failed; nothing was persisted.
    AnalysisFailed,
    /// The asset record could not be written.
    PersistFailed,
}

/// Result of [`Pipeline::run`](super::Pipeline::run).
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub asset_id: String,
    pub outcome: Outcome,
    stages: [StageStatus; 9],
    /// Originality score written to the record.
    pub score: Option<u8>,
    /// Nearest indexed assets found before this one was added.
    pub similar: Option<SearchHits>,
    pub index_outcome: Option<AddOutcome>,
    pub leaf_index: Option<u64>,
}

impl PipelineReport {
    pub(crate) fn new(asset_id: impl Into<String>) -> Self {
        Self {
            asset_id: asset_id.into(),
            outcome: Outcome::FetchFailed,
            stages: std::array::from_fn(|_| StageStatus::Skipped),
            score: None,
            similar: None,
            index_outcome: None,
            leaf_index: None,
        }
    }

    pub fn status(&self, stage: Stage) -> &StageStatus {
        &self.stages[stage.position()]
    }

    /// True when `stage` was attempted, whether or not it succeeded.
    pub fn ran(&self, stage: Stage) -> bool {
        !matches!(self.status(stage), StageStatus::Skipped)
    }

    pub fn failed_stages(&self) -> Vec<Stage> {
        Stage::ALL
            .into_iter()
            .filter(|s| self.status(*s).is_failed())
            .collect()
    }

    pub(crate) fn succeed(&mut self, stage: Stage) {
        self.stages[stage.position()] = StageStatus::Succeeded;
    }

    pub(crate) fn fail(&mut self, stage: Stage, reason: impl fmt::Display) {
        self.stages[stage.position()] = StageStatus::Failed(reason.to_string());
    }

    pub(crate) fn finish(mut self, outcome: Outcome) -> Self {
        self.outcome = outcome;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_report_has_every_stage_skipped() {
        let report = PipelineReport::new("a");
        assert!(Stage::ALL.iter().all(|s| !report.ran(*s)));
        assert!(report.failed_stages().is_empty());
    }

    #[test]
    fn test_stage_positions_follow_execution_order() {
        for (i, stage) in Stage::ALL.iter().enumerate() {
            assert_eq!(stage.position(), i);
        }
    }

    #[test]
    fn test_fail_records_reason() {
        let mut report = PipelineReport::new("a");
        report.succeed(Stage::Fetch);
        report.fail(Stage::Badge, "disk full");
        assert!(report.status(Stage::Fetch).is_success());
        assert_eq!(
            report.status(Stage::Badge),
            &StageStatus::Failed("disk full".into())
        );
        assert_eq!(report.failed_stages(), vec![Stage::Badge]);
    }
}
