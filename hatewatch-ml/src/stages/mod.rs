//! Pipeline stages that wrap the data, training and evaluation building
//! blocks with file layout and remote sync.

pub mod ingestion;
pub mod pusher;
pub mod transformation;
pub mod validation;

pub use ingestion::DataIngestion;
pub use pusher::ModelPusher;
pub use transformation::DataTransformation;
pub use validation::{DataValidation, ValidationReport, check_sources};
