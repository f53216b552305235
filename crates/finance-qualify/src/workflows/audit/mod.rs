//! Re-evaluates stored qualification records from a CSV export and reports
//! rows whose stored decision no longer matches the rules.

mod mapping;
mod normalizer;
mod parser;

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::workflows::qualification::{EvaluationConfig, FinancingPlan, QualificationEvaluator};

#[derive(Debug)]
pub enum AuditImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for AuditImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditImportError::Io(err) => write!(f, "failed to read qualification export: {}", err),
            AuditImportError::Csv(err) => write!(f, "invalid qualification CSV data: {}", err),
        }
    }
}

impl std::error::Error for AuditImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AuditImportError::Io(err) => Some(err),
            AuditImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for AuditImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for AuditImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Row whose stored decision disagrees with re-evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditMismatch {
    /// 1-based data row, excluding the header.
    pub row: usize,
    pub stored_qualified: bool,
    pub stored_reason: Option<String>,
    pub recomputed_qualified: bool,
    pub recomputed_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub row_count: usize,
    pub qualified_count: usize,
    pub mismatches: Vec<AuditMismatch>,
    /// Rows without a readable `qualified` column.
    pub missing_flag: Vec<usize>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty() && self.missing_flag.is_empty()
    }
}

pub struct QualificationAuditor;

impl QualificationAuditor {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        config: EvaluationConfig,
        evaluated_at: DateTime<Utc>,
    ) -> Result<AuditReport, AuditImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, config, evaluated_at)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        config: EvaluationConfig,
        evaluated_at: DateTime<Utc>,
    ) -> Result<AuditReport, AuditImportError> {
        let evaluator = QualificationEvaluator::new(config);
        let mut report = AuditReport::default();

        for (index, stored) in parser::parse_rows(reader)?.into_iter().enumerate() {
            let row = index + 1;
            report.row_count += 1;

            let plan = FinancingPlan::from_record(&stored.record);
            let verdict = evaluator.evaluate_at(&stored.record, &plan, evaluated_at);
            if verdict.is_qualified() {
                report.qualified_count += 1;
            }

            let Some(stored_qualified) = stored.qualified else {
                report.missing_flag.push(row);
                continue;
            };

            if stored_qualified != verdict.is_qualified() {
                report.mismatches.push(AuditMismatch {
                    row,
                    stored_qualified,
                    stored_reason: stored.disqualification_reason,
                    recomputed_qualified: verdict.is_qualified(),
                    recomputed_reason: verdict
                        .disqualification_reason()
                        .map(|reason| reason.summary()),
                });
            }
        }

        if report.is_clean() {
            info!(rows = report.row_count, "qualification audit found no drift");
        } else {
            warn!(
                rows = report.row_count,
                mismatches = report.mismatches.len(),
                missing_flag = report.missing_flag.len(),
                "qualification audit found drift"
            );
        }

        Ok(report)
    }
}
