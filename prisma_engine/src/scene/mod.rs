//! Scene boundary consumed by the renderer
//!
//! A scene is anything that can enumerate renderables and expose its
//! lighting. `Scene` is the stock slot-map backed implementation.

mod renderable;
mod scene;

pub use renderable::{Renderable, RenderableKey};
pub use scene::{RenderScene, Scene};
