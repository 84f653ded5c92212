//! Box overlap scoring.

use crate::types::{clamp_extent, BoundingBox};

/// Compute Intersection-over-Union between two bounding boxes.
///
/// Negative or non-finite extents count as zero, so degenerate boxes never
/// overlap anything. Returns 0.0 for disjoint boxes and for a zero union.
pub fn overlap(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let (aw, ah) = (clamp_extent(a.width), clamp_extent(a.height));
    let (bw, bh) = (clamp_extent(b.width), clamp_extent(b.height));

    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = (a.x + aw).min(b.x + bw);
    let y2 = (a.y + ah).min(b.y + bh);

    let inter_w = (x2 - x1).max(0.0);
    let inter_h = (y2 - y1).max(0.0);
    let inter_area = inter_w * inter_h;

    let union_area = aw * ah + bw * bh - inter_area;

    if union_area > 0.0 && inter_area.is_finite() {
        (inter_area / union_area).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(x: f32, y: f32, w: f32, h: f32) -> BoundingBox {
        BoundingBox::new(x, y, w, h)
    }

    #[test]
    fn test_overlap_identical() {
        let a = bbox(10.0, 10.0, 100.0, 100.0);
        assert!((overlap(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_overlap_no_intersection() {
        let a = bbox(0.0, 0.0, 50.0, 50.0);
        let b = bbox(200.0, 200.0, 50.0, 50.0);
        assert_eq!(overlap(&a, &b), 0.0);
    }

    #[test]
    fn test_overlap_touching_edges_is_zero() {
        let a = bbox(0.0, 0.0, 10.0, 10.0);
        let b = bbox(10.0, 0.0, 10.0, 10.0);
        assert_eq!(overlap(&a, &b), 0.0);
    }

    #[test]
    fn test_overlap_partial() {
        let a = bbox(0.0, 0.0, 10.0, 10.0);
        let b = bbox(5.0, 0.0, 10.0, 10.0);
        // Overlap: 5x10 = 50, union: 100+100-50 = 150
        assert!((overlap(&a, &b) - 50.0 / 150.0).abs() < 1e-6);
    }

    #[test]
    fn test_overlap_contained() {
        let outer = bbox(0.0, 0.0, 100.0, 100.0);
        let inner = bbox(25.0, 25.0, 50.0, 50.0);
        assert!((overlap(&outer, &inner) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_overlap_symmetric() {
        let boxes = [
            bbox(0.0, 0.0, 10.0, 10.0),
            bbox(3.0, 4.0, 12.5, 7.0),
            bbox(-5.0, 2.0, 9.0, 30.0),
            bbox(8.0, 8.0, 0.0, 5.0),
            bbox(1.0, 1.0, -4.0, 4.0),
        ];
        for a in &boxes {
            for b in &boxes {
                assert_eq!(overlap(a, b), overlap(b, a));
            }
        }
    }

    #[test]
    fn test_overlap_degenerate_boxes() {
        let zero = BoundingBox::default();
        assert_eq!(overlap(&zero, &zero), 0.0);

        let a = bbox(0.0, 0.0, 10.0, 10.0);
        assert_eq!(overlap(&a, &zero), 0.0);
        assert_eq!(overlap(&a, &bbox(0.0, 0.0, -10.0, 10.0)), 0.0);
        assert_eq!(overlap(&a, &bbox(0.0, 0.0, f32::NAN, 10.0)), 0.0);
    }
}
