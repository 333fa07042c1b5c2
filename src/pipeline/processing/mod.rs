// Pipeline processing: schema normalization of raw batches

pub mod normalize;

pub use normalize::{Normalized, Normalizer, StructuralInputError};
