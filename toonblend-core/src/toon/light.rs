use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Opaque reference to a host shading model. Never dereferenced here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShadingModelHandle(pub u64);

/// Opaque host ray sampler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SamplerHandle(pub u64);

/// Opaque id of the object being shaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightDescriptor {
    pub intensity: Vec3,
    /// Unit vector from the surface towards the light, camera space.
    pub direction: Vec3,
    pub ambient: bool,
    pub diffuse: bool,
    pub specular: bool,
    pub shading_model: Option<ShadingModelHandle>,
}

impl LightDescriptor {
    pub fn directional(direction: Vec3, intensity: Vec3) -> Self {
        Self {
            intensity,
            direction,
            ambient: false,
            diffuse: true,
            specular: true,
            shading_model: None,
        }
    }

    pub fn ambient(intensity: Vec3) -> Self {
        Self {
            intensity,
            direction: Vec3::ZERO,
            ambient: true,
            diffuse: false,
            specular: false,
            shading_model: None,
        }
    }

    pub fn with_shading_model(mut self, handle: ShadingModelHandle) -> Self {
        self.shading_model = Some(handle);
        self
    }
}

/// Ray state handed through verbatim to the ray tracer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayContext {
    pub origin: Vec3,
    pub direction: Vec3,
    pub sampler: SamplerHandle,
    pub depth: i16,
    pub object_id: ObjectId,
}

impl RayContext {
    pub fn primary(direction: Vec3) -> Self {
        Self {
            origin: Vec3::ZERO,
            direction,
            sampler: SamplerHandle::default(),
            depth: 0,
            object_id: ObjectId::default(),
        }
    }
}
