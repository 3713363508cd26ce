use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{to_points, SceneError};
use crate::blend::{BlendError, BlendNode, NodeConfig};
use crate::linalg::{invert, LinalgError, Matrix};
use crate::toon::{
    EnvironmentTracer, LambertModel, LightDescriptor, NoTracer, ObjectId, RayContext, RayTracer,
    SamplerHandle, ShadingError, ShadingInputs, ShadingModelHandle, ToonMaterial, ToonOptions,
    ToonRamp, ToonShader,
};

fn one() -> f32 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlendScene {
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default = "one")]
    pub envelope: f32,
    pub base: Vec<[f32; 3]>,
    #[serde(default)]
    pub targets: Vec<TargetSpec>,
    #[serde(default)]
    pub paint_weights: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSpec {
    pub name: String,
    #[serde(default)]
    pub weight: f32,
    pub positions: Vec<[f32; 3]>,
}

impl BlendScene {
    pub fn build(&self) -> Result<BlendNode, BlendError> {
        let targets = self
            .targets
            .iter()
            .map(|t| (t.name.clone(), to_points(&t.positions)))
            .collect();
        let weights: Vec<f32> = self.targets.iter().map(|t| t.weight).collect();
        let base = to_points(&self.base);
        let mut node = BlendNode::from_parts(self.node.clone(), base, targets, &weights)?;
        node.set_envelope(self.envelope);
        if let Some(paint) = &self.paint_weights {
            node.set_paint_weights(paint.clone())?;
        }
        Ok(node)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LightSpec {
    pub intensity: Vec3,
    pub direction: Vec3,
    pub ambient: bool,
    pub diffuse: bool,
    pub specular: bool,
    pub shading_model: Option<u64>,
}

impl Default for LightSpec {
    fn default() -> Self {
        Self {
            intensity: Vec3::ONE,
            direction: Vec3::Z,
            ambient: false,
            diffuse: true,
            specular: false,
            shading_model: None,
        }
    }
}

impl From<&LightSpec> for LightDescriptor {
    fn from(l: &LightSpec) -> Self {
        LightDescriptor {
            intensity: l.intensity,
            direction: l.direction,
            ambient: l.ambient,
            diffuse: l.diffuse,
            specular: l.specular,
            shading_model: l.shading_model.map(ShadingModelHandle),
        }
    }
}

/// Surface sample in camera space.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleSpec {
    pub normal: Vec3,
    pub point: Vec3,
    /// Falls back to `normal` when absent.
    pub triangle_normal: Option<Vec3>,
}

impl Default for SampleSpec {
    fn default() -> Self {
        Self { normal: Vec3::Z, point: Vec3::new(0.0, 0.0, -1.0), triangle_normal: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RaySpec {
    pub origin: Vec3,
    pub direction: Vec3,
    pub sampler: u64,
    pub depth: i16,
    pub object_id: u64,
}

impl Default for RaySpec {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            direction: Vec3::new(0.0, 0.0, -1.0),
            sampler: 0,
            depth: 0,
            object_id: 0,
        }
    }
}

impl From<&RaySpec> for RayContext {
    fn from(r: &RaySpec) -> Self {
        RayContext {
            origin: r.origin,
            direction: r.direction,
            sampler: SamplerHandle(r.sampler),
            depth: r.depth,
            object_id: ObjectId(r.object_id),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToonScene {
    pub material: ToonMaterial,
    pub lights: Vec<LightSpec>,
    pub sample: SampleSpec,
    pub ray: Option<RaySpec>,
    /// Uniform color seen by reflection rays; without it tracing fails.
    pub environment: Option<Vec3>,
    pub ramp: ToonRamp,
    pub options: ToonOptions,
}

impl ToonScene {
    pub fn light_descriptors(&self) -> Vec<LightDescriptor> {
        self.lights.iter().map(LightDescriptor::from).collect()
    }

    pub fn inputs(&self) -> ShadingInputs {
        ShadingInputs {
            surface_normal: self.sample.normal,
            camera_position: self.sample.point,
            triangle_normal: self.sample.triangle_normal.unwrap_or(self.sample.normal),
            material: self.material,
        }
    }

    pub fn ray_context(&self) -> Option<RayContext> {
        self.ray.as_ref().map(RayContext::from)
    }

    pub fn tracer(&self) -> Box<dyn RayTracer> {
        match self.environment {
            Some(color) => Box::new(EnvironmentTracer::new(color)),
            None => Box::new(NoTracer),
        }
    }

    /// Shade the scene's single sample with the headless collaborators.
    pub fn evaluate(&self) -> Result<Vec3, ShadingError> {
        let tracer = self.tracer();
        let shader = ToonShader::new(&LambertModel, tracer.as_ref())
            .with_ramp(self.ramp.clone())?
            .with_options(self.options);
        shader.evaluate(&self.inputs(), &self.light_descriptors(), self.ray_context().as_ref())
    }
}

/// Either kind of scene, told apart by the presence of `base`. Both kinds
/// reject unknown keys, so other documents match neither.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnyScene {
    Blend(BlendScene),
    Toon(ToonScene),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixDoc {
    pub rows: Vec<Vec<f64>>,
}

impl MatrixDoc {
    pub fn to_matrix(&self) -> Result<Matrix<f64>, LinalgError> {
        Matrix::from_rows(self.rows.clone())
    }

    pub fn invert(&self) -> Result<MatrixDoc, SceneError> {
        let inv = invert(&self.to_matrix()?)?;
        Ok(MatrixDoc { rows: inv.to_rows() })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoseDoc {
    pub positions: Vec<[f32; 3]>,
}

impl PoseDoc {
    pub fn points(&self) -> Vec<Vec3> {
        to_points(&self.positions)
    }
}
