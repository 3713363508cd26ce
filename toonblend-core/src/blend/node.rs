use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::accumulator::deform_in_place_with;
use super::{BlendConfig, BlendError, BlendSource, PaintWeights};

/// Identity and tuning of a blend node, passed in at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub name: String,
    pub type_id: u32,
    pub blend: BlendConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self { name: "blendMesh".into(), type_id: 0x232, blend: BlendConfig::default() }
    }
}

#[derive(Debug, Clone)]
struct Target {
    name: String,
    positions: Vec<Vec3>,
    weight: f32,
}

/// A base mesh plus named blend targets, weights, envelope and paint weights.
#[derive(Debug, Clone)]
pub struct BlendNode {
    config: NodeConfig,
    base: Vec<Vec3>,
    targets: Vec<Target>,
    name_to_index: HashMap<String, usize>,
    envelope: f32,
    paint_weights: Option<Vec<f32>>,
}

impl BlendNode {
    pub fn new(config: NodeConfig, base: Vec<Vec3>) -> Self {
        Self {
            config,
            base,
            targets: Vec::new(),
            name_to_index: HashMap::new(),
            envelope: 1.0,
            paint_weights: None,
        }
    }

    /// Build a node from parallel mesh and weight sequences.
    pub fn from_parts(
        config: NodeConfig,
        base: Vec<Vec3>,
        targets: Vec<(String, Vec<Vec3>)>,
        weights: &[f32],
    ) -> Result<Self, BlendError> {
        if targets.len() != weights.len() {
            return Err(BlendError::WeightCountMismatch {
                meshes: targets.len(),
                weights: weights.len(),
            });
        }
        let mut node = Self::new(config, base);
        for ((name, positions), &w) in targets.into_iter().zip(weights) {
            let index = node.add_target(name, positions)?;
            node.set_weight(index, w)?;
        }
        Ok(node)
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn base(&self) -> &[Vec3] {
        &self.base
    }

    pub fn vertex_count(&self) -> usize {
        self.base.len()
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    pub fn envelope(&self) -> f32 {
        self.envelope
    }

    pub fn add_target(
        &mut self,
        name: impl Into<String>,
        positions: Vec<Vec3>,
    ) -> Result<usize, BlendError> {
        let name = name.into();
        if self.name_to_index.contains_key(&name) {
            return Err(BlendError::DuplicateTarget(name));
        }
        let index = self.targets.len();
        if positions.len() != self.base.len() {
            return Err(BlendError::VertexCountMismatch {
                source_index: index,
                expected: self.base.len(),
                found: positions.len(),
            });
        }
        self.name_to_index.insert(name.clone(), index);
        self.targets.push(Target { name, positions, weight: 0.0 });
        Ok(index)
    }

    pub fn find_target(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    pub fn target_name(&self, index: usize) -> Option<&str> {
        self.targets.get(index).map(|t| t.name.as_str())
    }

    pub fn target_positions(&self, index: usize) -> Option<&[Vec3]> {
        self.targets.get(index).map(|t| t.positions.as_slice())
    }

    pub fn weight(&self, index: usize) -> Option<f32> {
        self.targets.get(index).map(|t| t.weight)
    }

    /// Weights are kept in [0, 1].
    pub fn set_weight(&mut self, index: usize, weight: f32) -> Result<(), BlendError> {
        let target = self.targets.get_mut(index).ok_or(BlendError::UnknownTarget(index))?;
        let clamped = weight.clamp(0.0, 1.0);
        if clamped != weight {
            log::warn!(
                "{}: weight {} for `{}` clamped to {}",
                self.config.name,
                weight,
                target.name,
                clamped
            );
        }
        target.weight = clamped;
        Ok(())
    }

    pub fn set_envelope(&mut self, envelope: f32) {
        self.envelope = envelope.clamp(0.0, 1.0);
    }

    pub fn set_paint_weights(&mut self, weights: Vec<f32>) -> Result<(), BlendError> {
        if weights.len() != self.base.len() {
            return Err(BlendError::PaintWeightCountMismatch {
                expected: self.base.len(),
                found: weights.len(),
            });
        }
        self.paint_weights = Some(weights);
        Ok(())
    }

    pub fn clear_paint_weights(&mut self) {
        self.paint_weights = None;
    }

    pub fn reset_weights(&mut self) {
        for t in &mut self.targets {
            t.weight = 0.0;
        }
    }

    /// Deformed positions for the current weights and envelope.
    pub fn evaluate(&self) -> Result<Vec<Vec3>, BlendError> {
        let sources: Vec<BlendSource<'_>> = self
            .targets
            .iter()
            .map(|t| BlendSource::new(&t.positions, t.weight))
            .collect();
        let paint = match &self.paint_weights {
            Some(ws) => PaintWeights::PerVertex(ws),
            None => PaintWeights::Uniform(1.0),
        };
        log::debug!(
            "evaluating {} (type {:#x}): {} targets, envelope {}",
            self.config.name,
            self.config.type_id,
            sources.len(),
            self.envelope
        );
        let mut points = self.base.clone();
        deform_in_place_with(&self.config.blend, &mut points, &sources, self.envelope, paint)?;
        Ok(points)
    }
}
