//! Toon (cel) lighting: a Lambert/Phong light fold, a stepped diffuse ramp,
//! and an optional ray-traced reflection with a dark silhouette rim.

mod collaborators;
mod light;
mod material;
mod ramp;
mod shader;

pub use collaborators::{
    CollaboratorError, EnvironmentTracer, LambertModel, NoTracer, RayQuery, RayTracer, ShadingModel,
    TraceSample,
};
pub use light::{LightDescriptor, ObjectId, RayContext, SamplerHandle, ShadingModelHandle};
pub use material::ToonMaterial;
pub use ramp::{RampBand, ToonRamp};
pub use shader::{
    accumulate_lights, reflection_direction, LightAccumulation, ShadingInputs, ToonShader,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShadingError {
    #[error("shading model query failed")]
    ShadingModel(#[source] CollaboratorError),
    #[error("reflection ray trace failed")]
    RayTrace(#[source] CollaboratorError),
    #[error("reflection gain is {0} but no ray context was supplied")]
    MissingRayContext(f32),
    #[error("invalid toon ramp: {0}")]
    InvalidRamp(String),
}

/// Composition switches and geometric constants of the toon evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToonOptions {
    /// Add incandescence to the final color. Off reproduces the classic node.
    pub apply_incandescence: bool,
    /// Add the specular accumulator to the final color. Off reproduces the classic node.
    pub apply_specular: bool,
    /// Reflections closer than this to the surface plane render black.
    pub silhouette_threshold: f32,
    /// Push applied to reflections that dip under the triangle.
    pub reflection_bias: f32,
}

impl Default for ToonOptions {
    fn default() -> Self {
        Self {
            apply_incandescence: false,
            apply_specular: false,
            silhouette_threshold: 0.33,
            reflection_bias: 0.01,
        }
    }
}
