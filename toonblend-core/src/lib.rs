pub mod blend;
pub mod toon;
pub mod linalg;
pub mod retarget;
pub mod scene;
pub mod preview;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
