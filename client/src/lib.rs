//! Core of a browser obby: a fixed-step platformer simulation with a
//! procedural course, a blocky animated character and presence data for
//! other players. The simulation modules are plain Rust; the renderer, audio
//! and the JavaScript-facing engine handle only build for `wasm32`.

pub mod animation;
pub mod camera;
pub mod color;
pub mod config;
pub mod driver;
pub mod error;
pub mod game;
pub mod input;
pub mod level;
pub mod physics;
pub mod platform;
pub mod player;
pub mod presence;
pub mod rig;
pub mod settings;

#[cfg(target_arch = "wasm32")]
mod audio;
#[cfg(target_arch = "wasm32")]
mod render;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use driver::{FrameDriver, FrameReport, LoopHandle};
pub use error::EngineError;
pub use game::{GameEvent, GameState, SoundCue};
pub use level::LevelKind;
pub use settings::GameSettings;
