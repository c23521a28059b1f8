//! Frame interpolation (tweening).
//!
//! Each voxel is crossfaded linearly between the two key frames and thresholded at
//! one half, so a generated frame is always binary: a voxel is lit when it is closer
//! to "on" than to "off" at that point of the blend.

use super::frame::{CUBE_SIZE, Frame};

/// Generate `steps` frames strictly between `a` and `b`.
///
/// Step `s` (1-based) uses `t = s / (steps + 1)`, so neither key frame is repeated.
/// `steps == 0` yields an empty vector.
pub fn interpolate(a: &Frame, b: &Frame, steps: usize) -> Vec<Frame> {
    let denom = (steps + 1) as f64;
    (1..=steps)
        .map(|s| blend(a, b, s as f64 / denom))
        .collect()
}

/// Threshold blend of two frames at position `t` in `[0, 1]`.
pub fn blend(a: &Frame, b: &Frame, t: f64) -> Frame {
    let mut out = Frame::blank();
    for (idx, cell) in out.cells_mut().iter_mut().enumerate() {
        let (ca, cb) = (a.cell(idx), b.cell(idx));
        for z in 0..CUBE_SIZE {
            let on_a = f64::from((ca >> z) & 1);
            let on_b = f64::from((cb >> z) & 1);
            let value = on_a * (1.0 - t) + on_b * t;
            if value >= 0.5 {
                *cell |= 1 << z;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn any_frame() -> impl Strategy<Value = Frame> {
        prop::collection::vec(any::<u8>(), 64).prop_map(|cells| Frame::from_cells(&cells))
    }

    #[test]
    fn test_zero_steps_is_empty() {
        let a = Frame::blank();
        let mut b = Frame::blank();
        b.fill(true);
        assert!(interpolate(&a, &b, 0).is_empty());
    }

    #[test]
    fn test_off_to_on_switches_at_midpoint() {
        let a = Frame::blank();
        let mut b = Frame::blank();
        b.fill(true);

        // t = 0.25, 0.5, 0.75
        let frames = interpolate(&a, &b, 3);
        assert_eq!(frames.len(), 3);
        assert!(frames[0].is_blank());
        assert_eq!(frames[1].lit_count(), 512);
        assert_eq!(frames[2].lit_count(), 512);
    }

    #[test]
    fn test_on_to_off_holds_until_midpoint() {
        let mut a = Frame::blank();
        a.set(4, 4, 4, true);
        let b = Frame::blank();

        // t = 0.2, 0.4, 0.6, 0.8
        let frames = interpolate(&a, &b, 4);
        let lit: Vec<bool> = frames.iter().map(|f| f.get(4, 4, 4)).collect();
        assert_eq!(lit, vec![true, true, false, false]);
    }

    #[test]
    fn test_single_step_lights_union() {
        let mut a = Frame::blank();
        a.set(0, 0, 0, true);
        let mut b = Frame::blank();
        b.set(7, 7, 7, true);

        // t = 0.5 exactly: both voxels sit on the threshold
        let frames = interpolate(&a, &b, 1);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].get(0, 0, 0));
        assert!(frames[0].get(7, 7, 7));
        assert_eq!(frames[0].lit_count(), 2);
    }

    #[test]
    fn test_inputs_not_mutated() {
        let a = Frame::from_cells(&[0xFF; 64]);
        let b = Frame::blank();
        let (a_before, b_before) = (a, b);
        let _ = interpolate(&a, &b, 5);
        assert_eq!(a, a_before);
        assert_eq!(b, b_before);
    }

    #[test]
    fn test_short_inputs_normalized() {
        let a = Frame::from_cells(&[0xFF]);
        let b = Frame::from_cells(&[0xFF; 64]);
        let frames = interpolate(&a, &b, 1);
        // Missing cells of `a` blend as off, so t = 0.5 lights them
        assert_eq!(frames[0].lit_count(), 512);
    }

    proptest! {
        #[test]
        fn prop_length_matches_steps(a in any_frame(), b in any_frame(), steps in 0usize..32) {
            prop_assert_eq!(interpolate(&a, &b, steps).len(), steps);
        }

        #[test]
        fn prop_same_frame_is_fixed_point(a in any_frame(), steps in 0usize..16) {
            let frames = interpolate(&a, &a, steps);
            prop_assert_eq!(frames.len(), steps);
            for f in frames {
                prop_assert_eq!(f, a);
            }
        }
    }
}
