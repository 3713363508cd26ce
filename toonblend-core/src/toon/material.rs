use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToonMaterial {
    pub color: Vec3,
    pub incandescence: Vec3,
    pub diffuse_reflectivity: f32,
    /// Phong exponent; the built-in light path uses its magnitude.
    pub specular_power: f32,
    pub specular_intensity: f32,
    pub reflect_gain: f32,
}

impl Default for ToonMaterial {
    fn default() -> Self {
        Self {
            color: Vec3::new(0.0, 0.58824, 0.644),
            incandescence: Vec3::ZERO,
            diffuse_reflectivity: 0.8,
            specular_power: 10.0,
            specular_intensity: 0.5,
            reflect_gain: 0.5,
        }
    }
}
