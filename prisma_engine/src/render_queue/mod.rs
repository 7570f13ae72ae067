/// Render queues: per-frame object lists, sorting and dispatch

mod render_object;
mod render_queue;
mod render_queue_manager;
mod render_queue_builder;

pub use render_object::{
    MaterialRef, GeometryHandle, RenderObject,
    distance_key, calculate_sort_key,
};
pub use render_queue::{
    RenderQueueId, QueueBand, SortMode, RenderQueue,
    DrawParams, SubmitStats, BoundState,
};
pub use render_queue_manager::{RenderQueueManager, QueueStats, QueueRange};
pub use render_queue_builder::{RenderQueueBuilder, BuildStats};
