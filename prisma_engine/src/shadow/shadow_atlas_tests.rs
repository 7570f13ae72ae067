use super::*;

fn overlaps(a: &AtlasRect, b: &AtlasRect) -> bool {
    a.x < b.x + b.width && b.x < a.x + a.width && a.y < b.y + b.height && b.y < a.y + a.height
}

#[test]
fn test_fills_shelf_left_to_right() {
    let mut atlas = ShadowAtlas::new(2048, 2048);
    let a = atlas.allocate(1024, 1024).unwrap();
    let b = atlas.allocate(1024, 1024).unwrap();
    let c = atlas.allocate(512, 512).unwrap();
    assert_eq!(a, AtlasRect { x: 0, y: 0, width: 1024, height: 1024 });
    assert_eq!(b, AtlasRect { x: 1024, y: 0, width: 1024, height: 1024 });
    assert_eq!(c, AtlasRect { x: 0, y: 1024, width: 512, height: 512 });
}

#[test]
fn test_smaller_maps_reuse_taller_shelf() {
    let mut atlas = ShadowAtlas::new(2048, 2048);
    atlas.allocate(1024, 1024).unwrap();
    let small = atlas.allocate(512, 512).unwrap();
    assert_eq!((small.x, small.y), (1024, 0));
}

#[test]
fn test_full_atlas_returns_none() {
    let mut atlas = ShadowAtlas::new(1024, 1024);
    for _ in 0..4 {
        assert!(atlas.allocate(512, 512).is_some());
    }
    assert!(atlas.allocate(512, 512).is_none());
    assert!(atlas.allocate(4096, 16).is_none());
    assert!(atlas.allocate(0, 16).is_none());
    assert_eq!(atlas.occupancy(), 1.0);
}

#[test]
fn test_allocations_never_overlap() {
    let mut atlas = ShadowAtlas::default();
    let sizes = [1024, 256, 512, 512, 256, 1024, 128, 512, 256];
    let mut rects = Vec::new();
    for size in sizes {
        if let Some(rect) = atlas.allocate(size, size) {
            assert!(rect.x + rect.width <= 2048 && rect.y + rect.height <= 2048);
            rects.push(rect);
        }
    }
    for (i, a) in rects.iter().enumerate() {
        for b in &rects[i + 1..] {
            assert!(!overlaps(a, b), "{:?} overlaps {:?}", a, b);
        }
    }
    assert_eq!(atlas.allocated(), rects.as_slice());
}

#[test]
fn test_reset_frees_everything() {
    let mut atlas = ShadowAtlas::new(512, 512);
    atlas.allocate(512, 512).unwrap();
    assert!(atlas.allocate(1, 1).is_none());
    atlas.reset();
    assert!(atlas.allocated().is_empty());
    assert_eq!(atlas.allocate(512, 512).unwrap().y, 0);
}
