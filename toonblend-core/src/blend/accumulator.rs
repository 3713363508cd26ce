use glam::Vec3;
use rayon::prelude::*;

use super::{BlendConfig, BlendError, BlendSource, PaintWeights};

/// Blend a single vertex.
///
/// `envelope == 0.0` returns `base` untouched, bit for bit.
#[inline]
pub fn blend_point<I>(base: Vec3, sources: I, envelope: f32, paint_weight: f32) -> Vec3
where
    I: IntoIterator<Item = (Vec3, f32)>,
{
    if envelope == 0.0 {
        return base;
    }
    let mut result = base;
    for (target, weight) in sources {
        result += (target - base) * weight * envelope * paint_weight;
    }
    result
}

/// Deform a whole vertex set and return the new positions.
pub fn deform(
    base: &[Vec3],
    sources: &[BlendSource<'_>],
    envelope: f32,
    paint: PaintWeights<'_>,
) -> Result<Vec<Vec3>, BlendError> {
    deform_with(&BlendConfig::default(), base, sources, envelope, paint)
}

pub fn deform_with(
    config: &BlendConfig,
    base: &[Vec3],
    sources: &[BlendSource<'_>],
    envelope: f32,
    paint: PaintWeights<'_>,
) -> Result<Vec<Vec3>, BlendError> {
    let mut points = base.to_vec();
    deform_in_place_with(config, &mut points, sources, envelope, paint)?;
    Ok(points)
}

/// Deform `points` in place; they are read as the base positions.
pub fn deform_in_place(
    points: &mut [Vec3],
    sources: &[BlendSource<'_>],
    envelope: f32,
    paint: PaintWeights<'_>,
) -> Result<(), BlendError> {
    deform_in_place_with(&BlendConfig::default(), points, sources, envelope, paint)
}

pub(crate) fn deform_in_place_with(
    config: &BlendConfig,
    points: &mut [Vec3],
    sources: &[BlendSource<'_>],
    envelope: f32,
    paint: PaintWeights<'_>,
) -> Result<(), BlendError> {
    validate(points.len(), sources, &paint)?;
    if envelope == 0.0 {
        log::trace!("envelope is zero, leaving {} vertices untouched", points.len());
        return Ok(());
    }

    let apply = |(index, point): (usize, &mut Vec3)| {
        let w = paint.at(index);
        *point = blend_point(
            *point,
            sources.iter().map(|s| (s.positions[index], s.weight)),
            envelope,
            w,
        );
    };

    if points.len() >= config.parallel_threshold {
        points.par_iter_mut().enumerate().for_each(apply);
    } else {
        points.iter_mut().enumerate().for_each(apply);
    }
    log::debug!(
        "blended {} vertices from {} sources (envelope={})",
        points.len(),
        sources.len(),
        envelope
    );
    Ok(())
}

fn validate(
    vertex_count: usize,
    sources: &[BlendSource<'_>],
    paint: &PaintWeights<'_>,
) -> Result<(), BlendError> {
    for (source_index, s) in sources.iter().enumerate() {
        if s.positions.len() != vertex_count {
            return Err(BlendError::VertexCountMismatch {
                source_index,
                expected: vertex_count,
                found: s.positions.len(),
            });
        }
    }
    if let PaintWeights::PerVertex(ws) = paint {
        if ws.len() != vertex_count {
            return Err(BlendError::PaintWeightCountMismatch {
                expected: vertex_count,
                found: ws.len(),
            });
        }
    }
    Ok(())
}
