//! Low-resolution "LED matrix" display core.
//!
//! Effects draw into a fixed logical grid (32×32, 64×32 or 32×64) chosen from
//! the viewport shape. The [`engine::Engine`] drives them at a fixed rate,
//! centers the logical grid on the visual grid and writes only the cells that
//! changed to the host [`host::Surface`].

pub mod app;
pub mod config;
pub mod dimensions;
pub mod effect;
pub mod effects;
pub mod engine;
pub mod error;
pub mod frame;
pub mod host;
pub mod input;
pub mod lifecycle;
pub mod loader;
pub mod registry;
pub mod render;
pub mod scheduler;
pub mod shared;
pub mod terminal;
pub mod token;

pub use effect::{Effect, Hooks, Registration, UpdateResult};
pub use engine::Engine;
pub use error::CoreError;
pub use frame::{Config, FrameBuffer, Resolution};
pub use shared::Shared;
pub use token::{Colors, Token};
