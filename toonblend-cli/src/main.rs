use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use toonblend_core::retarget::{self, RetargetOptions};
use toonblend_core::scene::{self, AnyScene, BlendScene, MatrixDoc, PoseDoc, ToonScene};
use toonblend_core::{preview, VERSION};

#[derive(Parser, Debug)]
#[command(name = "toonblend", version = VERSION, about = "Blend-shape and toon shading tools")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize a blend or toon scene
    Inspect { path: String },
    /// Evaluate a blend scene and emit the deformed positions as JSON
    Blend {
        path: String,
        #[arg(long)]
        out: Option<String>,
    },
    /// Shade the single sample described by a toon scene
    Shade { path: String },
    /// Invert the matrix in a YAML/JSON document
    Invert { path: String },
    /// Fit target weights of a blend scene to a pose
    Retarget {
        path: String,
        #[arg(long)]
        pose: String,
        /// Keep weights outside [0, 1]
        #[arg(long)]
        no_clamp: bool,
        #[arg(long, default_value_t = 0.0)]
        damping: f64,
    },
    /// Render a toon-shaded sphere with the scene's lights and material
    Preview {
        path: String,
        #[arg(long, default_value_t = 256)]
        width: u32,
        #[arg(long, default_value_t = 256)]
        height: u32,
        #[arg(long, default_value = "toon-preview.png")]
        out: String,
    },
}

fn load<T: DeserializeOwned>(path: &str) -> Result<T> {
    scene::load_from_path(path).with_context(|| format!("loading {}", path))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Inspect { path } => {
            let doc: AnyScene = load(&path)?;
            match doc {
                AnyScene::Blend(s) => {
                    println!("Blend scene: {} (type {:#x})", s.node.name, s.node.type_id);
                    println!("  vertices: {}", s.base.len());
                    println!("  envelope: {:.2}", s.envelope);
                    for t in &s.targets {
                        println!("  target {}: weight {:.2}", t.name, t.weight);
                    }
                    let paint = if s.paint_weights.is_some() { "per-vertex" } else { "uniform" };
                    println!("  paint weights: {}", paint);
                }
                AnyScene::Toon(s) => {
                    println!("Toon scene");
                    println!("  lights: {}", s.lights.len());
                    println!("  color: {:?}", s.material.color.to_array());
                    println!("  reflect gain: {:.2}", s.material.reflect_gain);
                    println!("  ramp bands: {} (floor {:.2})", s.ramp.bands.len(), s.ramp.floor);
                    println!("  ray context: {}", if s.ray.is_some() { "yes" } else { "no" });
                }
            }
        }
        Command::Blend { path, out } => {
            let doc: BlendScene = load(&path)?;
            let node = doc.build()?;
            let points = node.evaluate()?;
            let json = serde_json::to_string_pretty(&scene::from_points(&points))?;
            match out {
                Some(out) => {
                    std::fs::write(&out, json).with_context(|| format!("writing {}", out))?;
                    println!("Wrote {} positions to {}", points.len(), out);
                }
                None => println!("{}", json),
            }
        }
        Command::Shade { path } => {
            let doc: ToonScene = load(&path)?;
            let color = doc.evaluate()?;
            println!("{:.6} {:.6} {:.6}", color.x, color.y, color.z);
        }
        Command::Invert { path } => {
            let doc: MatrixDoc = load(&path)?;
            let inv = doc.invert()?;
            println!("{}", serde_json::to_string_pretty(&inv)?);
        }
        Command::Retarget { path, pose, no_clamp, damping } => {
            let doc: BlendScene = load(&path)?;
            let pose: PoseDoc = load(&pose)?;
            let node = doc.build()?;
            let options = RetargetOptions { clamp: !no_clamp, damping };
            let weights = retarget::fit_node(&node, &pose.points(), &options)?;
            for (i, w) in weights.iter().enumerate() {
                println!("{}: {:.6}", node.target_name(i).unwrap_or("?"), w);
            }
        }
        Command::Preview { path, width, height, out } => {
            let doc: ToonScene = load(&path)?;
            let pixels = preview::render_sphere(&doc, width, height)?;
            let img = image::RgbaImage::from_raw(width, height, preview::to_rgba8(&pixels))
                .ok_or_else(|| anyhow::anyhow!("Failed to create image from raw"))?;
            img.save(&out)?;
            log::info!("preview written to {}", out);
            println!("Wrote {}x{} image to {}", width, height, out);
        }
    }
    Ok(())
}
