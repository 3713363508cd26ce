//! Scene documents: blend setups, toon samples, matrices and poses, read from
//! YAML or JSON.

pub mod schema;

use std::path::Path;

use glam::Vec3;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use schema::{
    AnyScene, BlendScene, LightSpec, MatrixDoc, PoseDoc, RaySpec, SampleSpec, TargetSpec, ToonScene,
};

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("failed to read scene file")]
    Io(#[from] std::io::Error),
    #[error("invalid YAML scene")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON scene")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Linalg(#[from] crate::linalg::LinalgError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// `.json` files are JSON, everything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Yaml,
        }
    }
}

pub fn load_from_str<T: DeserializeOwned>(s: &str, format: Format) -> Result<T, SceneError> {
    let doc = match format {
        Format::Yaml => serde_yaml::from_str(s)?,
        Format::Json => serde_json::from_str(s)?,
    };
    Ok(doc)
}

pub fn load_from_path<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, SceneError> {
    let path = path.as_ref();
    let data = std::fs::read_to_string(path)?;
    log::debug!("loading {}", path.display());
    load_from_str(&data, Format::from_path(path))
}

/// Reinterpret `[x, y, z]` triples as vectors.
pub fn to_points(raw: &[[f32; 3]]) -> Vec<Vec3> {
    bytemuck::cast_slice::<[f32; 3], Vec3>(raw).to_vec()
}

pub fn from_points(points: &[Vec3]) -> Vec<[f32; 3]> {
    bytemuck::cast_slice::<Vec3, [f32; 3]>(points).to_vec()
}
