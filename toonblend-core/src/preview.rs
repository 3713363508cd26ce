//! Headless preview: a unit sphere shaded per pixel with the toon evaluator.

use glam::Vec3;
use thiserror::Error;

use crate::scene::ToonScene;
use crate::toon::{LambertModel, RayContext, ShadingError, ShadingInputs, ToonShader};

/// Camera-space distance from the eye to the sphere center.
pub const SPHERE_DISTANCE: f32 = 3.0;

/// Largest frame `render_sphere` accepts, in pixels.
pub const MAX_PIXELS: usize = 1 << 24;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("preview size {width}x{height} is empty or exceeds {} pixels", MAX_PIXELS)]
    InvalidSize { width: u32, height: u32 },
    #[error(transparent)]
    Shading(#[from] ShadingError),
}

/// Shade a `width` x `height` frame, row-major from the top-left.
/// Pixels off the sphere are black.
pub fn render_sphere(
    scene: &ToonScene,
    width: u32,
    height: u32,
) -> Result<Vec<Vec3>, PreviewError> {
    let pixel_count = (width as usize)
        .checked_mul(height as usize)
        .filter(|&n| n > 0 && n <= MAX_PIXELS)
        .ok_or(PreviewError::InvalidSize { width, height })?;

    let tracer = scene.tracer();
    let shader = ToonShader::new(&LambertModel, tracer.as_ref())
        .with_ramp(scene.ramp.clone())?
        .with_options(scene.options);
    let lights = scene.light_descriptors();
    let base_ray = scene.ray_context().unwrap_or_else(|| RayContext::primary(-Vec3::Z));
    let center = Vec3::new(0.0, 0.0, -SPHERE_DISTANCE);
    let radius_px = width.min(height) as f32 * 0.5;

    let mut pixels = Vec::with_capacity(pixel_count);
    for py in 0..height {
        for px in 0..width {
            let x = (px as f32 + 0.5 - width as f32 * 0.5) / radius_px;
            let y = (height as f32 * 0.5 - py as f32 - 0.5) / radius_px;
            let r2 = x * x + y * y;
            if r2 > 1.0 {
                pixels.push(Vec3::ZERO);
                continue;
            }
            let normal = Vec3::new(x, y, (1.0 - r2).sqrt());
            let point = center + normal;
            let ray = RayContext { origin: Vec3::ZERO, direction: point.normalize(), ..base_ray };
            let inputs = ShadingInputs {
                surface_normal: normal,
                camera_position: point,
                triangle_normal: normal,
                material: scene.material,
            };
            pixels.push(shader.evaluate(&inputs, &lights, Some(&ray))?);
        }
    }
    log::debug!("rendered {}x{} toon preview", width, height);
    Ok(pixels)
}

/// Pack linear colors into opaque RGBA8.
pub fn to_rgba8(pixels: &[Vec3]) -> Vec<u8> {
    pixels
        .iter()
        .flat_map(|c| {
            let c = c.clamp(Vec3::ZERO, Vec3::ONE) * 255.0;
            [c.x.round() as u8, c.y.round() as u8, c.z.round() as u8, 255]
        })
        .collect()
}
