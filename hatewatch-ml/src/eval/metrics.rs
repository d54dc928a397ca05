//! Binary classification metrics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 2x2 confusion matrix; rows are true labels, columns predicted labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
}

impl ConfusionMatrix {
    pub fn from_labels(truth: &[u8], predicted: &[u8]) -> Self {
        let mut m = Self::default();
        for (&t, &p) in truth.iter().zip(predicted) {
            match (t, p) {
                (0, 0) => m.true_negative += 1,
                (0, _) => m.false_positive += 1,
                (_, 0) => m.false_negative += 1,
                _ => m.true_positive += 1,
            }
        }
        m
    }

    pub fn total(&self) -> usize {
        self.true_negative + self.false_positive + self.false_negative + self.true_positive
    }

    /// Fraction of correct predictions; 0 for an empty matrix.
    pub fn accuracy(&self) -> f64 {
        ratio(self.true_negative + self.true_positive, self.total())
    }

    pub fn as_rows(&self) -> [[usize; 2]; 2] {
        [
            [self.true_negative, self.false_positive],
            [self.false_negative, self.true_positive],
        ]
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

/// Precision, recall and F1 for one class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

impl ClassMetrics {
    fn new(tp: usize, fp: usize, fn_: usize) -> Self {
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        Self {
            precision,
            recall,
            f1,
            support: tp + fn_,
        }
    }
}

/// Per-class metrics with macro and support-weighted averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Indexed by label: `[no hate, hate]`.
    pub classes: [ClassMetrics; 2],
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    pub fn from_confusion(m: &ConfusionMatrix) -> Self {
        let negative = ClassMetrics::new(m.true_negative, m.false_negative, m.false_positive);
        let positive = ClassMetrics::new(m.true_positive, m.false_positive, m.false_negative);
        let classes = [negative, positive];
        let total = m.total();

        let average = |weight: &dyn Fn(&ClassMetrics) -> f64| ClassMetrics {
            precision: classes.iter().map(|c| c.precision * weight(c)).sum(),
            recall: classes.iter().map(|c| c.recall * weight(c)).sum(),
            f1: classes.iter().map(|c| c.f1 * weight(c)).sum(),
            support: total,
        };
        let macro_avg = average(&|_| 0.5);
        let weighted_avg = average(&|c| ratio(c.support, total));

        Self {
            classes,
            accuracy: m.accuracy(),
            macro_avg,
            weighted_avg,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>14} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        let row = |f: &mut fmt::Formatter<'_>, name: &str, c: &ClassMetrics| {
            writeln!(
                f,
                "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, c.precision, c.recall, c.f1, c.support
            )
        };
        row(f, "0", &self.classes[0])?;
        row(f, "1", &self.classes[1])?;
        writeln!(
            f,
            "{:>14} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        row(f, "macro avg", &self.macro_avg)?;
        row(f, "weighted avg", &self.weighted_avg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_confusion_matrix_counts() {
        let truth = [1, 1, 0, 0, 1];
        let pred = [1, 0, 0, 1, 1];
        let m = ConfusionMatrix::from_labels(&truth, &pred);
        assert_eq!(m.as_rows(), [[1, 1], [1, 2]]);
        assert!(close(m.accuracy(), 0.6));
    }

    #[test]
    fn test_report_values() {
        let m = ConfusionMatrix {
            true_negative: 1,
            false_positive: 1,
            false_negative: 1,
            true_positive: 2,
        };
        let report = ClassificationReport::from_confusion(&m);
        let pos = report.classes[1];
        assert!(close(pos.precision, 2.0 / 3.0));
        assert!(close(pos.recall, 2.0 / 3.0));
        assert_eq!(pos.support, 3);
        let neg = report.classes[0];
        assert!(close(neg.precision, 0.5));
        assert_eq!(neg.support, 2);
        assert!(close(report.macro_avg.precision, (0.5 + 2.0 / 3.0) / 2.0));
        assert!(close(
            report.weighted_avg.recall,
            0.5 * 2.0 / 5.0 + (2.0 / 3.0) * 3.0 / 5.0
        ));
        assert!(report.to_string().contains("weighted avg"));
    }

    #[test]
    fn test_empty_matrix_is_all_zero() {
        let m = ConfusionMatrix::default();
        assert_eq!(m.accuracy(), 0.0);
        let report = ClassificationReport::from_confusion(&m);
        assert_eq!(report.macro_avg.f1, 0.0);
    }
}
