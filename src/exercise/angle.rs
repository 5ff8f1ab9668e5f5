//! Joint angle from three keypoints.
//!
//! The angle at `b` is taken between vectors b→a and b→c, i.e.
//! cos(θ) = (ba · bc) / (|ba| × |bc|). Only x/y are used; confidence is
//! ignored here.

use crate::types::Point;

/// Returned for any triple the angle can't be computed from. Read
/// downstream as "fully extended, no bend".
pub const STRAIGHT_ANGLE: f64 = 180.0;

/// Interior angle at `b` in degrees, in [0, 180].
///
/// Degenerate triples (zero-length vector, non-finite coordinate) give
/// [`STRAIGHT_ANGLE`].
pub fn joint_angle(a: &Point, b: &Point, c: &Point) -> f64 {
    if !(a.is_finite() && b.is_finite() && c.is_finite()) {
        return STRAIGHT_ANGLE;
    }

    let ba = (a.x - b.x, a.y - b.y);
    let bc = (c.x - b.x, c.y - b.y);

    let norm_ba = ba.0.hypot(ba.1);
    let norm_bc = bc.0.hypot(bc.1);
    if norm_ba == 0.0 || norm_bc == 0.0 || !norm_ba.is_finite() || !norm_bc.is_finite() {
        return STRAIGHT_ANGLE;
    }

    // atan2(|ba × bc|, ba · bc) equals acos of the clamped cosine but keeps
    // full precision near 0° and 180°, where acos loses ~1e-6°.
    let dot = ba.0 * bc.0 + ba.1 * bc.1;
    let cross = ba.0 * bc.1 - ba.1 * bc.0;

    cross.abs().atan2(dot).to_degrees().clamp(0.0, STRAIGHT_ANGLE)
}

/// Like [`joint_angle`] but tolerates missing points.
pub fn joint_angle_checked(a: Option<&Point>, b: Option<&Point>, c: Option<&Point>) -> f64 {
    match (a, b, c) {
        (Some(a), Some(b), Some(c)) => joint_angle(a, b, c),
        _ => STRAIGHT_ANGLE,
    }
}
