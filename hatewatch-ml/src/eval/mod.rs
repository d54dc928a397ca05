//! Held-out evaluation and champion comparison.

pub mod evaluator;
pub mod metrics;

pub use evaluator::{ModelEvaluator, decide_promotion};
pub use metrics::{ClassMetrics, ClassificationReport, ConfusionMatrix};
