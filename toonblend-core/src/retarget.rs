//! Least-squares fit of blend weights that reproduce a pose.
//!
//! With `D` the per-target delta matrix (three rows per vertex, one column per
//! target) the weights solve `(DᵀD + λI) w = Dᵀ (pose - base)`.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blend::BlendNode;
use crate::linalg::{invert, LinalgError, Matrix};

#[derive(Debug, Error, PartialEq)]
pub enum RetargetError {
    #[error("no blend targets to fit against")]
    NoTargets,
    #[error("{what} has {found} vertices, base has {expected}")]
    VertexCountMismatch { what: String, expected: usize, found: usize },
    #[error(transparent)]
    Linalg(#[from] LinalgError),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetargetOptions {
    /// Clamp fitted weights into the [0, 1] range blend nodes accept.
    pub clamp: bool,
    /// Ridge term added to the normal matrix diagonal.
    pub damping: f64,
}

impl Default for RetargetOptions {
    fn default() -> Self {
        Self { clamp: true, damping: 0.0 }
    }
}

pub fn fit_weights(
    base: &[Vec3],
    targets: &[&[Vec3]],
    pose: &[Vec3],
    options: &RetargetOptions,
) -> Result<Vec<f32>, RetargetError> {
    if targets.is_empty() {
        return Err(RetargetError::NoTargets);
    }
    let check = |what: String, len: usize| {
        if len == base.len() {
            Ok(())
        } else {
            Err(RetargetError::VertexCountMismatch { what, expected: base.len(), found: len })
        }
    };
    check("pose".into(), pose.len())?;
    for (i, t) in targets.iter().enumerate() {
        check(format!("target {}", i), t.len())?;
    }

    let rows = base.len() * 3;
    let mut deltas = Matrix::<f64>::zeros(rows, targets.len());
    for (c, target) in targets.iter().enumerate() {
        for (v, (t, b)) in target.iter().zip(base).enumerate() {
            let d = (*t - *b).as_dvec3();
            deltas[(v * 3, c)] = d.x;
            deltas[(v * 3 + 1, c)] = d.y;
            deltas[(v * 3 + 2, c)] = d.z;
        }
    }
    let offset: Vec<f64> = pose
        .iter()
        .zip(base)
        .flat_map(|(p, b)| (*p - *b).as_dvec3().to_array())
        .collect();

    let dt = deltas.transpose();
    let mut normal = dt.try_mul(&deltas)?;
    for i in 0..targets.len() {
        normal[(i, i)] += options.damping;
    }
    let rhs = dt.mul_vec(&offset)?;
    let weights = invert(&normal)?.mul_vec(&rhs)?;

    log::debug!("fitted {} weights over {} vertices", weights.len(), base.len());
    Ok(weights
        .into_iter()
        .map(|w| {
            let w = w as f32;
            if options.clamp { w.clamp(0.0, 1.0) } else { w }
        })
        .collect())
}

/// Fit weights for every target of `node` in target order.
pub fn fit_node(
    node: &BlendNode,
    pose: &[Vec3],
    options: &RetargetOptions,
) -> Result<Vec<f32>, RetargetError> {
    let targets: Vec<&[Vec3]> = (0..node.target_count())
        .filter_map(|i| node.target_positions(i))
        .collect();
    fit_weights(node.base(), &targets, pose, options)
}
