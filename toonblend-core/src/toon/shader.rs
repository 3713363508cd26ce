use glam::Vec3;

use super::collaborators::{RayQuery, RayTracer, ShadingModel};
use super::light::{LightDescriptor, RayContext};
use super::material::ToonMaterial;
use super::ramp::ToonRamp;
use super::{ShadingError, ToonOptions};

/// Per-sample surface data, all in camera space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadingInputs {
    pub surface_normal: Vec3,
    pub camera_position: Vec3,
    pub triangle_normal: Vec3,
    pub material: ToonMaterial,
}

/// Raw light sums before the toon ramp.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LightAccumulation {
    pub diffuse: Vec3,
    pub specular: Vec3,
}

/// Fold every light into diffuse and specular sums, in order.
///
/// `view_dir` is only read by lights that delegate to a shading model.
pub fn accumulate_lights(
    inputs: &ShadingInputs,
    lights: &[LightDescriptor],
    view_dir: Vec3,
    model: &dyn ShadingModel,
) -> Result<LightAccumulation, ShadingError> {
    let m = &inputs.material;
    let normal = inputs.surface_normal;
    let point = inputs.camera_position;
    let eye = point.normalize_or_zero();
    let mut acc = LightAccumulation::default();

    for (index, light) in lights.iter().enumerate() {
        if light.ambient {
            acc.diffuse += light.intensity;
        }

        match light.shading_model {
            None => {
                if !light.diffuse {
                    continue;
                }
                let cos_ln = light.direction.dot(normal);
                if cos_ln > 0.0 {
                    acc.diffuse += light.intensity * (cos_ln * m.diffuse_reflectivity);

                    let rv = ((2.0 * normal) * cos_ln - light.direction).dot(eye).abs();
                    let s = m.specular_intensity * rv.powf(m.specular_power.abs());
                    acc.specular += light.intensity * s;
                }
            }
            Some(handle) => {
                let cos_ln = model
                    .diffuse_reflectance(handle, light.direction, point, normal, true)
                    .map_err(ShadingError::ShadingModel)?;
                if cos_ln > 0.0 {
                    acc.diffuse += light.intensity * (cos_ln * m.diffuse_reflectivity);
                }

                if light.specular {
                    let spec_dir = model
                        .maximum_specular_reflection(
                            handle,
                            light.direction,
                            point,
                            normal,
                            view_dir,
                        )
                        .map_err(ShadingError::ShadingModel)?;
                    let attenuation = model
                        .light_attenuation(handle, point, normal, false)
                        .map_err(ShadingError::ShadingModel)?;

                    if spec_dir.dot(normal) > 0.0 {
                        let rv = 2.0 * normal * normal.dot(view_dir) - view_dir;
                        let s = m.specular_intensity * rv.dot(spec_dir).powf(m.specular_power);
                        acc.specular += light.intensity * s * attenuation;
                    }
                }
            }
        }
        log::trace!("light {}: diffuse={:?} specular={:?}", index, acc.diffuse, acc.specular);
    }
    Ok(acc)
}

/// Mirror the incoming ray about `normal`, keeping it above the triangle.
pub fn reflection_direction(
    ray_dir: Vec3,
    normal: Vec3,
    triangle_normal: Vec3,
    bias: f32,
) -> Vec3 {
    let l = -ray_dir;
    let d = l.dot(normal).abs();
    let mut r = 2.0 * normal * d - l;
    let below = r.dot(triangle_normal);
    if below < 0.0 {
        r = (r - below * triangle_normal).normalize_or_zero() + bias * triangle_normal;
    }
    r.normalize_or_zero()
}

/// Toon evaluator bound to its host collaborators.
pub struct ToonShader<'a> {
    model: &'a dyn ShadingModel,
    tracer: &'a dyn RayTracer,
    ramp: ToonRamp,
    options: ToonOptions,
}

impl<'a> ToonShader<'a> {
    pub fn new(model: &'a dyn ShadingModel, tracer: &'a dyn RayTracer) -> Self {
        Self {
            model,
            tracer,
            ramp: ToonRamp::default(),
            options: ToonOptions::default(),
        }
    }

    pub fn with_ramp(mut self, ramp: ToonRamp) -> Result<Self, ShadingError> {
        ramp.validate()?;
        self.ramp = ramp;
        Ok(self)
    }

    pub fn with_options(mut self, options: ToonOptions) -> Self {
        self.options = options;
        self
    }

    pub fn ramp(&self) -> &ToonRamp {
        &self.ramp
    }

    pub fn options(&self) -> &ToonOptions {
        &self.options
    }

    /// Shade one sample. Collaborator failures abort the whole evaluation.
    pub fn evaluate(
        &self,
        inputs: &ShadingInputs,
        lights: &[LightDescriptor],
        ray: Option<&RayContext>,
    ) -> Result<Vec3, ShadingError> {
        let m = &inputs.material;
        let view_dir = match ray {
            Some(r) => r.direction,
            None => inputs.camera_position.normalize_or_zero(),
        };
        let acc = accumulate_lights(inputs, lights, view_dir, self.model)?;

        let mut result = self.ramp.quantize_rgb(acc.diffuse) * m.color;
        if self.options.apply_incandescence {
            result += m.incandescence;
        }
        if self.options.apply_specular {
            result += acc.specular;
        }

        if m.reflect_gain > 0.0 {
            let ray = ray.ok_or(ShadingError::MissingRayContext(m.reflect_gain))?;
            let direction = reflection_direction(
                ray.direction,
                inputs.surface_normal,
                inputs.triangle_normal,
                self.options.reflection_bias,
            );
            let query = RayQuery {
                origin: inputs.camera_position,
                direction,
                object_id: ray.object_id,
                sampler: ray.sampler,
                depth: ray.depth,
            };
            let sample = self.tracer.trace(&query).map_err(ShadingError::RayTrace)?;

            if direction.dot(inputs.surface_normal) < self.options.silhouette_threshold {
                result = Vec3::ZERO;
            } else {
                result += m.reflect_gain * sample.color;
            }
        }

        log::debug!("toon sample: {} lights -> {:?}", lights.len(), result);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toon::{
        CollaboratorError, EnvironmentTracer, LambertModel, NoTracer, ObjectId, SamplerHandle,
        ShadingModelHandle, TraceSample,
    };
    use std::cell::RefCell;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    fn matte() -> ToonMaterial {
        ToonMaterial {
            color: Vec3::new(0.5, 0.25, 1.0),
            reflect_gain: 0.0,
            ..ToonMaterial::default()
        }
    }

    fn facing(material: ToonMaterial) -> ShadingInputs {
        ShadingInputs {
            surface_normal: Vec3::Z,
            camera_position: Vec3::new(0.0, 0.0, -5.0),
            triangle_normal: Vec3::Z,
            material,
        }
    }

    struct FixedModel {
        reflectance: f32,
        spec_dir: Vec3,
        attenuation: f32,
    }

    impl ShadingModel for FixedModel {
        fn diffuse_reflectance(
            &self,
            _: ShadingModelHandle,
            _: Vec3,
            _: Vec3,
            _: Vec3,
            _: bool,
        ) -> Result<f32, CollaboratorError> {
            Ok(self.reflectance)
        }

        fn maximum_specular_reflection(
            &self,
            _: ShadingModelHandle,
            _: Vec3,
            _: Vec3,
            _: Vec3,
            _: Vec3,
        ) -> Result<Vec3, CollaboratorError> {
            Ok(self.spec_dir)
        }

        fn light_attenuation(
            &self,
            _: ShadingModelHandle,
            _: Vec3,
            _: Vec3,
            _: bool,
        ) -> Result<f32, CollaboratorError> {
            Ok(self.attenuation)
        }
    }

    /// Remembers the view direction handed to the specular query.
    #[derive(Default)]
    struct ViewRecorder {
        view: RefCell<Option<Vec3>>,
    }

    impl ShadingModel for ViewRecorder {
        fn diffuse_reflectance(
            &self,
            _: ShadingModelHandle,
            _: Vec3,
            _: Vec3,
            _: Vec3,
            _: bool,
        ) -> Result<f32, CollaboratorError> {
            Ok(1.0)
        }

        fn maximum_specular_reflection(
            &self,
            _: ShadingModelHandle,
            _: Vec3,
            _: Vec3,
            _: Vec3,
            view_dir: Vec3,
        ) -> Result<Vec3, CollaboratorError> {
            *self.view.borrow_mut() = Some(view_dir);
            Ok(Vec3::Z)
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

    struct BrokenModel;

    impl ShadingModel for BrokenModel {
        fn diffuse_reflectance(
            &self,
            _: ShadingModelHandle,
            _: Vec3,
            _: Vec3,
            _: Vec3,
            _: bool,
        ) -> Result<f32, CollaboratorError> {
            Err("shading model detached".into())
        }

        fn maximum_specular_reflection(
            &self,
            _: ShadingModelHandle,
            _: Vec3,
            _: Vec3,
            _: Vec3,
            _: Vec3,
        ) -> Result<Vec3, CollaboratorError> {
            Err("shading model detached".into())
        }

        fn light_attenuation(
            &self,
            _: ShadingModelHandle,
            _: Vec3,
            _: Vec3,
            _: bool,
        ) -> Result<f32, CollaboratorError> {
            Err("shading model detached".into())
        }
    }

    /// Uniform environment that keeps the last query it served.
    struct RecordingTracer {
        color: Vec3,
        last: RefCell<Option<RayQuery>>,
    }

    impl RayTracer for RecordingTracer {
        fn trace(&self, query: &RayQuery) -> Result<TraceSample, CollaboratorError> {
            *self.last.borrow_mut() = Some(*query);
            Ok(TraceSample { color: self.color, transparency: Vec3::ZERO })
        }
    }

    #[test]
    fn no_lights_floors_at_lowest_band() {
        let shader = ToonShader::new(&LambertModel, &NoTracer);
        let out = shader.evaluate(&facing(matte()), &[], None).unwrap();
        assert!(close(out, Vec3::new(0.5, 0.25, 1.0) * 0.2));
    }

    #[test]
    fn direct_light_reaches_top_band() {
        let shader = ToonShader::new(&LambertModel, &NoTracer);
        let lights = [LightDescriptor::directional(Vec3::Z, Vec3::ONE)];
        let out = shader.evaluate(&facing(matte()), &lights, None).unwrap();
        assert!(close(out, Vec3::new(0.5, 0.25, 1.0)));
    }

    #[test]
    fn grazing_and_back_lights_add_nothing() {
        let inputs = facing(matte());
        let lights = [
            LightDescriptor::directional(-Vec3::Z, Vec3::ONE),
            LightDescriptor::directional(Vec3::X, Vec3::ONE),
        ];
        let acc = accumulate_lights(&inputs, &lights, Vec3::Z, &LambertModel).unwrap();
        assert_eq!(acc, LightAccumulation::default());
    }

    #[test]
    fn ambient_adds_intensity_directly() {
        let inputs = facing(matte());
        let lights = [LightDescriptor::ambient(Vec3::new(0.45, 0.1, 0.3))];
        let acc = accumulate_lights(&inputs, &lights, Vec3::Z, &LambertModel).unwrap();
        assert!(close(acc.diffuse, Vec3::new(0.45, 0.1, 0.3)));

        let shader = ToonShader::new(&LambertModel, &NoTracer);
        let out = shader.evaluate(&inputs, &lights, None).unwrap();
        assert!(close(out, Vec3::new(0.5 * 0.6, 0.25 * 0.2, 1.0 * 0.4)));
    }

    #[test]
    fn built_in_specular_accumulates_but_is_not_composed() {
        let inputs = facing(matte());
        let lights = [LightDescriptor::directional(Vec3::Z, Vec3::ONE)];
        let acc = accumulate_lights(&inputs, &lights, Vec3::Z, &LambertModel).unwrap();
        assert!(close(acc.diffuse, Vec3::splat(0.8)));
        assert!(close(acc.specular, Vec3::splat(0.5)));

        let classic = ToonShader::new(&LambertModel, &NoTracer);
        let out = classic.evaluate(&inputs, &lights, None).unwrap();
        assert!(close(out, inputs.material.color));

        let extended = ToonShader::new(&LambertModel, &NoTracer)
            .with_options(ToonOptions { apply_specular: true, ..ToonOptions::default() });
        let out = extended.evaluate(&inputs, &lights, None).unwrap();
        assert!(close(out, inputs.material.color + Vec3::splat(0.5)));
    }

    #[test]
    fn incandescence_only_in_alternate_mode() {
        let mut material = matte();
        material.incandescence = Vec3::new(0.1, 0.2, 0.3);
        let inputs = facing(material);

        let classic = ToonShader::new(&LambertModel, &NoTracer);
        assert!(close(classic.evaluate(&inputs, &[], None).unwrap(), material.color * 0.2));

        let glowing = ToonShader::new(&LambertModel, &NoTracer)
            .with_options(ToonOptions { apply_incandescence: true, ..ToonOptions::default() });
        let out = glowing.evaluate(&inputs, &[], None).unwrap();
        assert!(close(out, material.color * 0.2 + material.incandescence));
    }

    #[test]
    fn delegated_light_uses_shading_model() {
        let model = FixedModel { reflectance: 0.5, spec_dir: Vec3::Z, attenuation: 0.5 };
        let inputs = facing(matte());
        let light = LightDescriptor::directional(Vec3::X, Vec3::ONE)
            .with_shading_model(ShadingModelHandle(7));
        let acc = accumulate_lights(&inputs, &[light], Vec3::Z, &model).unwrap();
        assert!(close(acc.diffuse, Vec3::splat(0.4)));
        // r = 2N(N.v) - v = Z, dot(r, Z)^10 = 1, times ks 0.5 and attenuation 0.5
        assert!(close(acc.specular, Vec3::splat(0.25)));
    }

    #[test]
    fn delegated_diffuse_ignores_diffuse_flag() {
        let model = FixedModel { reflectance: 0.5, spec_dir: Vec3::Z, attenuation: 1.0 };
        let inputs = facing(matte());
        let mut light = LightDescriptor::directional(Vec3::X, Vec3::ONE)
            .with_shading_model(ShadingModelHandle(2));
        light.diffuse = false;
        light.specular = false;
        let acc = accumulate_lights(&inputs, &[light], Vec3::Z, &model).unwrap();
        assert!(close(acc.diffuse, Vec3::splat(0.4)));
        assert_eq!(acc.specular, Vec3::ZERO);

        // the built-in path honors the same flag
        let mut plain = LightDescriptor::directional(Vec3::Z, Vec3::ONE);
        plain.diffuse = false;
        let acc = accumulate_lights(&inputs, &[plain], Vec3::Z, &model).unwrap();
        assert_eq!(acc, LightAccumulation::default());
    }

    #[test]
    fn view_direction_falls_back_to_eye_ray() {
        let model = ViewRecorder::default();
        let shader = ToonShader::new(&model, &NoTracer);
        let inputs = ShadingInputs {
            camera_position: Vec3::new(0.0, 3.0, -4.0),
            ..facing(matte())
        };
        let lights = [LightDescriptor::directional(Vec3::Z, Vec3::ONE)
            .with_shading_model(ShadingModelHandle(5))];

        shader.evaluate(&inputs, &lights, None).unwrap();
        let seen = model.view.borrow().unwrap();
        assert!(close(seen, Vec3::new(0.0, 0.6, -0.8)));

        let ray = RayContext::primary(Vec3::X);
        shader.evaluate(&inputs, &lights, Some(&ray)).unwrap();
        assert_eq!(*model.view.borrow(), Some(Vec3::X));
    }

    #[test]
    fn shading_model_failure_aborts() {
        let shader = ToonShader::new(&BrokenModel, &NoTracer);
        let lights = [
            LightDescriptor::ambient(Vec3::ONE),
            LightDescriptor::directional(Vec3::Z, Vec3::ONE)
                .with_shading_model(ShadingModelHandle(3)),
        ];
        let err = shader.evaluate(&facing(matte()), &lights, None).unwrap_err();
        assert!(matches!(err, ShadingError::ShadingModel(_)));
    }

    #[test]
    fn reflection_adds_gained_environment() {
        let env = EnvironmentTracer::new(Vec3::new(1.0, 0.5, 0.0));
        let shader = ToonShader::new(&LambertModel, &env);
        let material = ToonMaterial { reflect_gain: 0.5, ..matte() };
        let ray = RayContext::primary(-Vec3::Z);
        let out = shader.evaluate(&facing(material), &[], Some(&ray)).unwrap();
        assert!(close(out, material.color * 0.2 + Vec3::new(0.5, 0.25, 0.0)));
    }

    #[test]
    fn reflection_query_carries_ray_state() {
        let tracer = RecordingTracer { color: Vec3::ONE, last: RefCell::new(None) };
        let shader = ToonShader::new(&LambertModel, &tracer);
        let inputs = facing(ToonMaterial { reflect_gain: 0.5, ..matte() });
        let ray = RayContext {
            origin: Vec3::new(9.0, 9.0, 9.0),
            direction: Vec3::new(0.6, 0.0, -0.8),
            sampler: SamplerHandle(11),
            depth: 3,
            object_id: ObjectId(42),
        };
        shader.evaluate(&inputs, &[], Some(&ray)).unwrap();

        let query = tracer.last.borrow().unwrap();
        assert_eq!(query.origin, inputs.camera_position);
        assert_eq!(query.object_id, ObjectId(42));
        assert_eq!(query.sampler, SamplerHandle(11));
        assert_eq!(query.depth, 3);
        let expected = reflection_direction(ray.direction, Vec3::Z, Vec3::Z, 0.01);
        assert_eq!(query.direction, expected);
        assert!(close(query.direction, Vec3::new(0.6, 0.0, 0.8)));
    }

    #[test]
    fn silhouette_forces_black() {
        let env = EnvironmentTracer::new(Vec3::ONE);
        let shader = ToonShader::new(&LambertModel, &env);
        let material = ToonMaterial { reflect_gain: 1.0, ..matte() };
        let z: f32 = 0.33 - 1e-3;
        let ray = RayContext::primary(Vec3::new((1.0 - z * z).sqrt(), 0.0, -z));
        let lights = [LightDescriptor::directional(Vec3::Z, Vec3::splat(10.0))];
        let out = shader.evaluate(&facing(material), &lights, Some(&ray)).unwrap();
        assert_eq!(out, Vec3::ZERO);

        let z: f32 = 0.5;
        let ray = RayContext::primary(Vec3::new((1.0 - z * z).sqrt(), 0.0, -z));
        let out = shader.evaluate(&facing(material), &lights, Some(&ray)).unwrap();
        assert_ne!(out, Vec3::ZERO);
    }

    #[test]
    fn trace_failure_aborts_even_at_silhouette() {
        let shader = ToonShader::new(&LambertModel, &NoTracer);
        let material = ToonMaterial { reflect_gain: 0.5, ..matte() };
        let ray = RayContext::primary(Vec3::X);
        let err = shader.evaluate(&facing(material), &[], Some(&ray)).unwrap_err();
        assert!(matches!(err, ShadingError::RayTrace(_)));
    }

    #[test]
    fn reflection_requires_ray_context() {
        let shader = ToonShader::new(&LambertModel, &NoTracer);
        let material = ToonMaterial { reflect_gain: 0.25, ..matte() };
        let err = shader.evaluate(&facing(material), &[], None).unwrap_err();
        assert!(matches!(err, ShadingError::MissingRayContext(g) if g == 0.25));
    }

    #[test]
    fn reflection_mirrors_about_normal() {
        let r = reflection_direction(Vec3::new(0.6, 0.0, -0.8), Vec3::Z, Vec3::Z, 0.01);
        assert!(close(r, Vec3::new(0.6, 0.0, 0.8)));
    }

    #[test]
    fn reflection_below_triangle_is_bent_back() {
        let tri = -Vec3::Y;
        let r = reflection_direction(Vec3::new(0.0, 0.6, -0.8), Vec3::Z, tri, 0.01);
        assert!(close(r, Vec3::new(0.0, -0.01, 1.0).normalize()));
    }
}
