use super::*;
use glam::Mat4;
use crate::graphics_device::mock_graphics_device::{MockCommandList, MockGraphicsDevice};
use crate::graphics_device::{
    BufferDesc, BufferUsage, FramebufferDesc, GraphicsDevice, Rect2D, RenderPassDesc,
};
use crate::render_queue::test_support::object_in_queue;
use crate::render_queue::{MaterialRef, RenderQueueId, SortMode};

fn ids(manager: &RenderQueueManager) -> Vec<u32> {
    manager.dispatch_order().map(|q| q.id()).collect()
}

// ============================================================================
// Routing
// ============================================================================

#[test]
fn test_new_has_five_band_queues() {
    let manager = RenderQueueManager::new();
    assert_eq!(ids(&manager), vec![1000, 2000, 2450, 3000, 4000]);
    assert_eq!(manager.queue_count(), 5);
    assert_eq!(manager.band(QueueBand::Transparent).sort_mode(), SortMode::BackToFront);
    assert_eq!(manager.band(QueueBand::Overlay).sort_mode(), SortMode::None);
}

#[test]
fn test_add_object_classifies_by_band() {
    let mut manager = RenderQueueManager::new();
    manager.add_object(object_in_queue("sky", 0.0, 1000));
    manager.add_object(object_in_queue("wall", 1.0, 2000));
    manager.add_object(object_in_queue("decal", 1.0, 2100));
    manager.add_object(object_in_queue("grass", 1.0, 2450));
    manager.add_object(object_in_queue("glass", 1.0, 3000));
    manager.add_object(object_in_queue("hud", 1.0, 5000));

    assert_eq!(manager.band(QueueBand::Background).len(), 1);
    assert_eq!(manager.band(QueueBand::Opaque).len(), 2);
    assert_eq!(manager.band(QueueBand::AlphaTest).len(), 1);
    assert_eq!(manager.band(QueueBand::Transparent).len(), 1);
    assert_eq!(manager.band(QueueBand::Overlay).len(), 1);

    let stats = manager.stats();
    assert_eq!(stats.total, 6);
    assert_eq!(stats.opaque, 2);
    assert_eq!(stats.custom, 0);
    assert_eq!(manager.object_count(), 6);
}

#[test]
fn test_exact_custom_queue_id_wins_over_band() {
    let mut manager = RenderQueueManager::new();
    manager.create_queue(2100, "Decals").unwrap();
    manager.add_object(object_in_queue("decal", 1.0, 2100));
    manager.add_object(object_in_queue("wall", 1.0, 2101));

    assert_eq!(manager.queue(2100).unwrap().len(), 1);
    assert_eq!(manager.band(QueueBand::Opaque).len(), 1);
    assert_eq!(manager.stats().custom, 1);
}

#[test]
fn test_create_queue_rejects_duplicates() {
    let mut manager = RenderQueueManager::new();
    assert!(matches!(manager.create_queue(2000, "Opaque2"), Err(Error::InvalidResource(_))));
    manager.create_queue(3500, "Water").unwrap();
    assert!(matches!(manager.create_queue(3500, "Water2"), Err(Error::InvalidResource(_))));
    assert_eq!(manager.queue(3500).unwrap().sort_mode(), SortMode::BackToFront);
}

#[test]
fn test_dispatch_order_is_bands_then_custom_by_id() {
    let mut manager = RenderQueueManager::new();
    manager.create_queue(4500, "Late").unwrap();
    manager.create_queue(500, "Early").unwrap();
    manager.create_queue(2100, "Mid").unwrap();
    assert_eq!(ids(&manager), vec![1000, 2000, 2450, 3000, 4000, 500, 2100, 4500]);
}

#[test]
fn test_queues_in_range() {
    let mut manager = RenderQueueManager::new();
    manager.create_queue(3500, "Water").unwrap();
    let opaque: Vec<u32> = manager.queues_in_range(QueueRange::OPAQUES).map(|q| q.id()).collect();
    assert_eq!(opaque, vec![1000, 2000, 2450]);
    let transparent: Vec<u32> = manager
        .queues_in_range(QueueRange::TRANSPARENTS)
        .map(|q| q.id())
        .collect();
    assert_eq!(transparent, vec![3000, 3500]);
}

#[test]
fn test_clear_keeps_custom_queues() {
    let mut manager = RenderQueueManager::new();
    manager.create_queue(3500, "Water").unwrap();
    manager.add_object(object_in_queue("a", 1.0, 3500));
    manager.add_object(object_in_queue("b", 1.0, 2000));
    manager.clear();
    assert_eq!(manager.object_count(), 0);
    assert!(manager.queue(3500).is_some());
    assert_eq!(manager.stats().total, 2);
    manager.reset_stats();
    assert_eq!(*manager.stats(), QueueStats::default());
}

// ============================================================================
// Submission
// ============================================================================

fn recording_setup() -> (MockGraphicsDevice, MockCommandList, MaterialRef) {
    let mut device = MockGraphicsDevice::new();
    let material = MaterialRef { id: 1, pipeline: device.register_pipeline("lit") };
    let rp = device.create_render_pass(&RenderPassDesc {
        color_attachments: vec![],
        depth_attachment: None,
    }).unwrap();
    let fb = device.create_framebuffer(&FramebufferDesc {
        render_pass: rp,
        color_attachments: vec![],
        depth_attachment: None,
        width: 8,
        height: 8,
    }).unwrap();
    let mut cmd = MockCommandList::standalone(&device);
    cmd.begin().unwrap();
    cmd.begin_render_pass(rp, fb, Rect2D::from_size(8, 8), &[]).unwrap();
    (device, cmd, material)
}

fn drawable(name: &str, queue_id: u32, material: MaterialRef, device: &mut MockGraphicsDevice) -> RenderObject {
    let mut o = object_in_queue(name, 1.0, queue_id);
    o.material = material;
    o.geometry.vertex_buffer = device
        .create_buffer(&BufferDesc { size: 64, usage: BufferUsage::Vertex })
        .unwrap();
    o.geometry.element_count = 3;
    o
}

#[test]
fn test_submit_all_visits_bands_in_order_regardless_of_insertion() {
    let (mut device, mut cmd, material) = recording_setup();
    let mut manager = RenderQueueManager::new();
    manager.create_queue(500, "Custom").unwrap();
    let items = [
        ("overlay", 4000),
        ("custom", 500),
        ("transparent", 3000),
        ("background", 1000),
        ("alpha", 2450),
        ("opaque", 2000),
    ];
    for (i, (name, id)) in items.iter().enumerate() {
        let mut o = drawable(name, *id, material, &mut device);
        o.geometry.element_count = 10 + i as u32;
        manager.add_object(o);
    }
    manager.sort_all();

    let mut bound = BoundState::default();
    let stats = manager.submit_all(&mut cmd, &DrawParams::new(Mat4::IDENTITY), &mut bound).unwrap();
    assert_eq!(stats.draw_calls, 6);

    let draws: Vec<&str> = cmd.commands.iter().filter(|c| c.starts_with("draw ")).map(|c| c.as_str()).collect();
    // element counts encode insertion index: background=13, opaque=15, alpha=14,
    // transparent=12, overlay=10, custom=11
    assert_eq!(draws, vec!["draw 13", "draw 15", "draw 14", "draw 12", "draw 10", "draw 11"]);
}

#[test]
fn test_submit_all_fails_on_unsorted_queue() {
    let (mut device, mut cmd, material) = recording_setup();
    let mut manager = RenderQueueManager::new();
    manager.add_object(drawable("a", 2000, material, &mut device));
    let mut bound = BoundState::default();
    let result = manager.submit_all(&mut cmd, &DrawParams::new(Mat4::IDENTITY), &mut bound);
    assert!(matches!(result, Err(Error::InvalidState(_))));
}

#[test]
fn test_submit_range_only_touches_range() {
    let (mut device, mut cmd, material) = recording_setup();
    let mut manager = RenderQueueManager::new();
    manager.add_object(drawable("opaque", 2000, material, &mut device));
    manager.add_object(drawable("glass", 3000, material, &mut device));
    manager.add_object(drawable("hud", 4000, material, &mut device));
    manager.sort_all();

    let mut bound = BoundState::default();
    let stats = manager
        .submit_range(QueueRange::TRANSPARENTS, &mut cmd, &DrawParams::new(Mat4::IDENTITY), &mut bound)
        .unwrap();
    assert_eq!(stats.draw_calls, 1);
}

#[test]
fn test_queue_range_bounds() {
    assert!(QueueRange::OPAQUES.contains(0));
    assert!(QueueRange::OPAQUES.contains(2999));
    assert!(!QueueRange::OPAQUES.contains(3000));
    assert!(QueueRange::OVERLAYS.contains(u32::MAX));
    assert_eq!(QueueRange::half_open(10, 20), QueueRange { first: 10, last: 19 });
    let empty = QueueRange::half_open(5, 5);
    assert!(!empty.contains(5));
    assert!(!empty.contains(0));
}
