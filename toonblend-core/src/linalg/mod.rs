//! Dense matrices and LU-based inversion.

mod lu;
mod matrix;

pub use lu::{invert, LuDecomposition};
pub use matrix::Matrix;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LinalgError {
    #[error("matrix is {rows}x{cols}, expected square")]
    NotSquare { rows: usize, cols: usize },
    #[error("matrix is singular (zero pivot at column {pivot})")]
    Singular { pivot: usize },
    #[error("dimension mismatch: {left:?} against {right:?}")]
    DimensionMismatch { left: (usize, usize), right: (usize, usize) },
    #[error("invalid shape: {0}")]
    InvalidShape(String),
}
