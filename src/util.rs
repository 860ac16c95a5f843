use nannou::math::*;

pub mod color;
pub use color::*;

pub mod priority_index;
pub use priority_index::*;

/// Returns the min and max values of an f32 slice.
pub fn minmax(arr: &[f32]) -> Option<(f32, f32)> {
    if arr.is_empty() {
        return None;
    }

    let mut min = arr[0];
    let mut max = arr[0];

    for e in arr.iter() {
        min = e.min(min);
        max = e.max(max);
    }

    Some((min, max))
}

pub fn map_clamp(val: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    map_range(val, in_min, in_max, out_min, out_max).clamp(out_min, out_max)
}
