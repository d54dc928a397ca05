//! # hatewatch-ml
//!
//! The stages of the Hatewatch training pipeline and the building blocks
//! they are made of: source table validation, dataset consolidation, tweet
//! normalization, tokenization, the pluggable classifier, held-out
//! evaluation with champion comparison, and the orchestrator that strings
//! them together. Also hosts the single-text prediction pipeline.

pub mod data;
pub mod error;
pub mod eval;
pub mod model;
pub mod pipeline;
pub mod prediction;
pub mod stages;
pub mod text;
pub mod training;

pub use error::{MlError, PipelineError};
pub use eval::decide_promotion;
pub use pipeline::{RunRecord, RunState, RunSummary, TrainPipeline};
pub use prediction::{Prediction, PredictionPipeline, Verdict};
pub use text::normalize;
