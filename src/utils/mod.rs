//! Utility modules
//!
//! This module contains utilities and helpers:
//! - Error types and result types
//! - Loss reporting
//! - Source metrics and image reference checks

pub mod analysis;
pub mod error;
pub mod loss;

// Re-export commonly used items
pub use analysis::{
    image_references, lint_source as lint_latex_source, metrics_source, unresolved_images,
    LatexMetrics,
};
pub use error::{ConversionError, ConversionResult};
pub use loss::{LossKind, LossRecord, LossReport};
