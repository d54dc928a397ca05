//! Training: data split and the model trainer stage.

pub mod split;
pub mod trainer;

pub use split::{Split, train_test_split};
pub use trainer::{HeldOutFeature, HeldOutLabel, ModelTrainer};
