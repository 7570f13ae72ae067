//! Per-frame data handed read-only to passes and features

mod rendering_data;
mod lighting;

pub use rendering_data::{RenderingData, RenderToggles};
pub use lighting::{LightType, AttenuationType, LightData, LightingData};
