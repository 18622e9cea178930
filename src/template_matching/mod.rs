//! Template matching module: locating a reference image on a captured screen
//!
//! - Image buffers decoded from captures or template files
//! - Fixed-point grayscale reduction
//! - Brute-force normalized cross-correlation with deterministic tie-break
pub mod error;
pub mod grayscale;
pub mod matcher;
pub mod types;

pub use error::MatchError;
pub use grayscale::reduce;
pub use matcher::TemplateMatcher;
pub use types::{Candidate, Image, IntensityField, MatchResult};
