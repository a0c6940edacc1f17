//! Rotated bounding-box computation.
//!
//! Used by the UI layer to report how much of the source a rotated crop
//! frame sweeps over; the render itself never resizes its canvas.

/// Compute the axis-aligned bounding box of a `width x height` rectangle
/// rotated by `angle_degrees` about its center.
///
/// # Example
///
/// ```ignore
/// // 90-degree rotation swaps dimensions
/// let (w, h) = rotated_size(100, 50, 90.0);
/// assert_eq!((w, h), (50, 100));
/// ```
pub fn rotated_size(width: u32, height: u32, angle_degrees: f64) -> (u32, u32) {
    // Normalize angle to handle 360, 720, etc.
    let angle_normalized = angle_degrees % 360.0;

    // Fast path: no rotation (including near-zero and multiples of 360)
    if angle_normalized.abs() < 0.001 || (360.0 - angle_normalized.abs()).abs() < 0.001 {
        return (width, height);
    }

    // Fast path: exact 90/270 degree rotations swap dimensions
    let abs_angle = angle_normalized.abs();
    if (abs_angle - 90.0).abs() < 0.001 || (abs_angle - 270.0).abs() < 0.001 {
        return (height, width);
    }

    // Fast path: exact 180 degree rotation keeps dimensions
    if (abs_angle - 180.0).abs() < 0.001 {
        return (width, height);
    }

    let angle_rad = angle_degrees.to_radians();
    let cos = angle_rad.cos().abs();
    let sin = angle_rad.sin().abs();

    let w = f64::from(width);
    let h = f64::from(height);

    // Bounding box of a rotated rectangle:
    // new_w = |w*cos| + |h*sin|
    // new_h = |w*sin| + |h*cos|
    let new_w = (w * cos + h * sin).ceil() as u32;
    let new_h = (w * sin + h * cos).ceil() as u32;

    (new_w.max(1), new_h.max(1))
}
