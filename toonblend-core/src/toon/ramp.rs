use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::ShadingError;

/// Values at or above `threshold` map to `value`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RampBand {
    pub threshold: f32,
    pub value: f32,
}

/// Step function applied per diffuse channel.
///
/// Bands are checked from the highest threshold down; anything below every
/// threshold (zero and negatives included) maps to `floor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToonRamp {
    pub bands: Vec<RampBand>,
    pub floor: f32,
}

impl Default for ToonRamp {
    fn default() -> Self {
        Self {
            bands: vec![
                RampBand { threshold: 0.60, value: 1.00 },
                RampBand { threshold: 0.40, value: 0.60 },
                RampBand { threshold: 0.20, value: 0.40 },
            ],
            floor: 0.20,
        }
    }
}

impl ToonRamp {
    pub fn validate(&self) -> Result<(), ShadingError> {
        for pair in self.bands.windows(2) {
            if pair[1].threshold >= pair[0].threshold {
                return Err(ShadingError::InvalidRamp(format!(
                    "thresholds must strictly descend, got {} then {}",
                    pair[0].threshold, pair[1].threshold
                )));
            }
        }
        if self.bands.iter().any(|b| !b.threshold.is_finite()) {
            return Err(ShadingError::InvalidRamp("thresholds must be finite".into()));
        }
        Ok(())
    }

    pub fn quantize(&self, value: f32) -> f32 {
        self.bands
            .iter()
            .find(|b| value >= b.threshold)
            .map_or(self.floor, |b| b.value)
    }

    pub fn quantize_rgb(&self, color: Vec3) -> Vec3 {
        Vec3::new(self.quantize(color.x), self.quantize(color.y), self.quantize(color.z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_edges_are_closed_below() {
        let ramp = ToonRamp::default();
        assert_eq!(ramp.quantize(0.60), 1.00);
        assert_eq!(ramp.quantize(0.40), 0.60);
        assert_eq!(ramp.quantize(0.20), 0.40);
        assert_eq!(ramp.quantize(0.1999), 0.20);
        assert_eq!(ramp.quantize(0.0), 0.20);
        assert_eq!(ramp.quantize(-4.0), 0.20);
        assert_eq!(ramp.quantize(7.5), 1.00);
        assert_eq!(ramp.quantize(0.5999), 0.60);
    }

    #[test]
    fn channels_quantize_independently() {
        let ramp = ToonRamp::default();
        assert_eq!(ramp.quantize_rgb(Vec3::new(0.7, 0.45, 0.05)), Vec3::new(1.0, 0.6, 0.2));
    }

    #[test]
    fn rejects_unordered_thresholds() {
        let ramp = ToonRamp {
            bands: vec![
                RampBand { threshold: 0.2, value: 0.5 },
                RampBand { threshold: 0.5, value: 1.0 },
            ],
            floor: 0.0,
        };
        assert!(matches!(ramp.validate(), Err(ShadingError::InvalidRamp(_))));
        assert!(ToonRamp::default().validate().is_ok());
    }
}
