//! Frame module - per-frame synchronization and explicit frame timing

mod frame_context;
mod frame_sync;

pub use frame_context::{FrameContext, FrameClock};
pub use frame_sync::{
    FrameSyncController, FrameSyncObjects, FrameState, AcquireOutcome, PresentOutcome,
};
