//! Ranked comparison of evaluated variants

use super::metrics::Metric;
use super::EvaluationReport;
use crate::error::Result;
use crate::training::ModelVariant;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{self, Write as _};

/// Stage at which a variant dropped out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Training,
    Evaluation,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureStage::Training => f.write_str("training"),
            FailureStage::Evaluation => f.write_str("evaluation"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedVariant {
    pub variant: ModelVariant,
    pub stage: FailureStage,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    /// 1-based position after ranking
    pub rank: usize,
    #[serde(flatten)]
    pub report: EvaluationReport,
}

/// Ranked reports plus the variants that failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonTable {
    pub primary_metric: Metric,
    pub rows: Vec<ComparisonRow>,
    pub failed: Vec<FailedVariant>,
}

impl ComparisonTable {
    /// Rank by `primary`, then accuracy, then canonical variant order
    pub fn compare(reports: Vec<EvaluationReport>, failed: Vec<FailedVariant>, primary: Metric) -> Self {
        let mut reports = reports;
        reports.sort_by(|a, b| rank_order(a, b, primary));

        let rows = reports
            .into_iter()
            .enumerate()
            .map(|(i, report)| ComparisonRow { rank: i + 1, report })
            .collect();

        let mut failed = failed;
        failed.sort_by_key(|f| f.variant);

        Self {
            primary_metric: primary,
            rows,
            failed,
        }
    }

    /// Highest ranked variant
    pub fn best(&self) -> Option<&ComparisonRow> {
        self.rows.first()
    }

    pub fn get(&self, variant: ModelVariant) -> Option<&ComparisonRow> {
        self.rows.iter().find(|r| r.report.variant == variant)
    }

    pub fn failure(&self, variant: ModelVariant) -> Option<&FailedVariant> {
        self.failed.iter().find(|f| f.variant == variant)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Plain-text report
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Model comparison (ranked by {})", self.primary_metric);
        let _ = writeln!(
            out,
            "{:<5} {:<10} {:>9} {:>9} {:>9} {:>9} {:>5} {:>5} {:>5} {:>5}",
            "rank", "variant", "accuracy", "precision", "recall", "f1", "tp", "fp", "tn", "fn"
        );
        for row in &self.rows {
            let r = &row.report;
            let _ = writeln!(
                out,
                "{:<5} {:<10} {:>9.4} {:>9.4} {:>9.4} {:>9.4} {:>5} {:>5} {:>5} {:>5}",
                row.rank,
                r.variant.to_string(),
                r.accuracy,
                r.precision,
                r.recall,
                r.f1,
                r.confusion.tp,
                r.confusion.fp,
                r.confusion.tn,
                r.confusion.fn_
            );
        }

        out.push('\n');
        if self.failed.is_empty() {
            out.push_str("Failed variants: none\n");
        } else {
            out.push_str("Failed variants:\n");
            for f in &self.failed {
                let _ = writeln!(out, "  {} ({}): {}", f.variant, f.stage, f.reason);
            }
        }
        out
    }
}

impl fmt::Display for ComparisonTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn rank_order(a: &EvaluationReport, b: &EvaluationReport, primary: Metric) -> Ordering {
    b.metric(primary)
        .total_cmp(&a.metric(primary))
        .then_with(|| b.accuracy.total_cmp(&a.accuracy))
        .then_with(|| a.variant.cmp(&b.variant))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::ConfusionMatrix;

    fn report(variant: ModelVariant, confusion: ConfusionMatrix) -> EvaluationReport {
        EvaluationReport::from_confusion(variant, confusion)
    }

    #[test]
    fn test_ranking_by_f1() {
        let reports = vec![
            report(ModelVariant::Logistic, ConfusionMatrix { tp: 5, fp: 5, tn: 5, fn_: 5 }),
            report(ModelVariant::Forest, ConfusionMatrix { tp: 8, fp: 2, tn: 8, fn_: 2 }),
        ];
        let table = ComparisonTable::compare(reports, Vec::new(), Metric::F1);
        assert_eq!(table.best().unwrap().report.variant, ModelVariant::Forest);
        assert_eq!(table.rows[1].rank, 2);
    }

    #[test]
    fn test_ties_broken_by_accuracy_then_variant() {
        // Same F1 (0 positives predicted), different accuracy
        let a = report(ModelVariant::Logistic, ConfusionMatrix { tp: 0, fp: 0, tn: 5, fn_: 5 });
        let b = report(ModelVariant::Boosted, ConfusionMatrix { tp: 0, fp: 0, tn: 8, fn_: 2 });
        let table = ComparisonTable::compare(vec![a.clone(), b], Vec::new(), Metric::F1);
        assert_eq!(table.best().unwrap().report.variant, ModelVariant::Boosted);

        // Identical metrics fall back to canonical order
        let c = report(ModelVariant::Boosted, a.confusion);
        let d = report(ModelVariant::Forest, a.confusion);
        let table = ComparisonTable::compare(vec![c, d, a], Vec::new(), Metric::F1);
        let order: Vec<_> = table.rows.iter().map(|r| r.report.variant).collect();
        assert_eq!(order, ModelVariant::ALL.to_vec());
    }

    #[test]
    fn test_render_lists_failures() {
        let reports = vec![report(ModelVariant::Forest, ConfusionMatrix { tp: 3, fp: 1, tn: 4, fn_: 2 })];
        let failed = vec![FailedVariant {
            variant: ModelVariant::Boosted,
            stage: FailureStage::Training,
            reason: "Convergence failed after 3 iterations".to_string(),
        }];
        let table = ComparisonTable::compare(reports, failed, Metric::F1);
        let text = table.render();
        assert!(text.contains("forest"));
        assert!(text.contains("Failed variants:"));
        assert!(text.contains("boosted (training): Convergence failed after 3 iterations"));
    }

    #[test]
    fn test_json_round_trip() {
        let reports = vec![report(ModelVariant::Logistic, ConfusionMatrix { tp: 1, fp: 1, tn: 1, fn_: 1 })];
        let table = ComparisonTable::compare(reports, Vec::new(), Metric::Accuracy);
        let json = table.to_json().unwrap();
        assert!(json.contains("\"variant\": \"logistic\""));
        let back: ComparisonTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}
