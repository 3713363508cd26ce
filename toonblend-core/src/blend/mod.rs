//! Blend-shape deformation: weighted additive offsets from source meshes.
//!
//! The accumulator is the pure per-vertex math; [`BlendNode`] owns a base mesh
//! plus named targets and plays the role of the deformer node's attributes.

mod accumulator;
mod node;

pub use accumulator::{blend_point, deform, deform_in_place, deform_with};
pub use node::{BlendNode, NodeConfig};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum BlendError {
    #[error("source {source_index} has {found} vertices, base has {expected}")]
    VertexCountMismatch { source_index: usize, expected: usize, found: usize },
    #[error("{meshes} source meshes but {weights} weights")]
    WeightCountMismatch { meshes: usize, weights: usize },
    #[error("{found} paint weights for {expected} vertices")]
    PaintWeightCountMismatch { expected: usize, found: usize },
    #[error("no blend target at index {0}")]
    UnknownTarget(usize),
    #[error("blend target `{0}` already exists")]
    DuplicateTarget(String),
}

/// One source mesh and its blend weight.
#[derive(Debug, Clone, Copy)]
pub struct BlendSource<'a> {
    pub positions: &'a [Vec3],
    pub weight: f32,
}

impl<'a> BlendSource<'a> {
    pub fn new(positions: &'a [Vec3], weight: f32) -> Self {
        Self { positions, weight }
    }
}

/// Per-vertex deformation strength, usually authored by weight painting.
#[derive(Debug, Clone, Copy)]
pub enum PaintWeights<'a> {
    Uniform(f32),
    PerVertex(&'a [f32]),
}

impl Default for PaintWeights<'_> {
    fn default() -> Self {
        PaintWeights::Uniform(1.0)
    }
}

impl PaintWeights<'_> {
    #[inline]
    pub(crate) fn at(&self, index: usize) -> f32 {
        match self {
            PaintWeights::Uniform(w) => *w,
            PaintWeights::PerVertex(ws) => ws[index],
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendConfig {
    /// Vertex sets at least this large are deformed on the rayon pool.
    pub parallel_threshold: usize,
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self { parallel_threshold: 4096 }
    }
}
