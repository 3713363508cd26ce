//! Interfaces to the host services the shader delegates to, plus simple
//! stand-ins for running without a host.

use glam::Vec3;

use super::light::{ObjectId, SamplerHandle, ShadingModelHandle};

pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

/// Host shading model attached to a light.
pub trait ShadingModel {
    fn diffuse_reflectance(
        &self,
        handle: ShadingModelHandle,
        light_dir: Vec3,
        point: Vec3,
        normal: Vec3,
        forward_facing: bool,
    ) -> Result<f32, CollaboratorError>;

    fn maximum_specular_reflection(
        &self,
        handle: ShadingModelHandle,
        light_dir: Vec3,
        point: Vec3,
        normal: Vec3,
        view_dir: Vec3,
    ) -> Result<Vec3, CollaboratorError>;

    fn light_attenuation(
        &self,
        handle: ShadingModelHandle,
        point: Vec3,
        normal: Vec3,
        flag: bool,
    ) -> Result<f32, CollaboratorError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayQuery {
    pub origin: Vec3,
    pub direction: Vec3,
    pub object_id: ObjectId,
    pub sampler: SamplerHandle,
    pub depth: i16,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceSample {
    pub color: Vec3,
    pub transparency: Vec3,
}

pub trait RayTracer {
    fn trace(&self, query: &RayQuery) -> Result<TraceSample, CollaboratorError>;
}

/// Plain Lambert shading model: reflectance is `dot(L, N)`, no attenuation.
#[derive(Debug, Default, Clone, Copy)]
pub struct LambertModel;

impl ShadingModel for LambertModel {
    fn diffuse_reflectance(
        &self,
        _: ShadingModelHandle,
        light_dir: Vec3,
        _: Vec3,
        normal: Vec3,
        _: bool,
    ) -> Result<f32, CollaboratorError> {
        Ok(light_dir.dot(normal))
    }

    fn maximum_specular_reflection(
        &self,
        _: ShadingModelHandle,
        light_dir: Vec3,
        _: Vec3,
        _: Vec3,
        _: Vec3,
    ) -> Result<Vec3, CollaboratorError> {
        Ok(light_dir)
    }

    fn light_attenuation(
        &self,
        _: ShadingModelHandle,
        _: Vec3,
        _: Vec3,
        _: bool,
    ) -> Result<f32, CollaboratorError> {
        Ok(1.0)
    }
}

/// Every ray hits the same uniform environment.
#[derive(Debug, Clone, Copy)]
pub struct EnvironmentTracer {
    pub color: Vec3,
    pub transparency: Vec3,
}

impl EnvironmentTracer {
    pub fn new(color: Vec3) -> Self {
        Self { color, transparency: Vec3::ZERO }
    }
}

impl RayTracer for EnvironmentTracer {
    fn trace(&self, query: &RayQuery) -> Result<TraceSample, CollaboratorError> {
        log::trace!("environment hit from {:?} along {:?}", query.origin, query.direction);
        Ok(TraceSample { color: self.color, transparency: self.transparency })
    }
}

/// Tracer for contexts without ray tracing; every request fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTracer;

impl RayTracer for NoTracer {
    fn trace(&self, _: &RayQuery) -> Result<TraceSample, CollaboratorError> {
        Err("ray tracing unavailable".into())
    }
}
