//! Text normalization and tokenization.

pub mod normalize;
pub mod stopwords;
pub mod tokenizer;

pub use normalize::{TextNormalizer, normalize};
pub use tokenizer::{Tokenizer, pad_sequence, pad_sequences};
