//! Screen-space 2D math. Arithmetic comes from `glam::Vec2`; this module adds
//! the compass-heading convention the agents steer by.

/// 2D vector in screen space (y grows downward).
pub type Vector = glam::Vec2;

/// Heading helpers on top of [`Vector`].
pub trait Compass: Sized {
    /// Angle in degrees `[0, 360)` measured counter-clockwise on screen from
    /// the "up" axis, so up = 0, left = 90, down = 180, right = 270.
    /// The zero vector has heading 0.
    fn heading(self) -> f32;

    /// Unit vector pointing along `heading` (degrees, same convention as [`Compass::heading`]).
    fn from_heading(heading: f32) -> Self;

    /// Clamp each component independently to `[-limit, limit]`.
    fn clamp_components(self, limit: f32) -> Self;
}

impl Compass for Vector {
    fn heading(self) -> f32 {
        if self == Vector::ZERO {
            return 0.0;
        }
        (-self.x).atan2(-self.y).to_degrees().rem_euclid(360.0)
    }

    fn from_heading(heading: f32) -> Self {
        let rad = heading.to_radians();
        Vector::new(-rad.sin(), -rad.cos())
    }

    fn clamp_components(self, limit: f32) -> Self {
        self.clamp(Vector::splat(-limit), Vector::splat(limit))
    }
}

/// Smallest absolute difference between two headings, in degrees `[0, 180]`.
pub fn angle_between(a: f32, b: f32) -> f32 {
    let diff = (a - b).rem_euclid(360.0);
    diff.min(360.0 - diff)
}

/// Circular mean of a set of headings in degrees. `None` for an empty input.
pub fn circular_mean(headings: impl IntoIterator<Item = f32>) -> Option<f32> {
    let mut sin_sum = 0.0f32;
    let mut cos_sum = 0.0f32;
    let mut count = 0usize;
    for h in headings {
        let rad = h.to_radians();
        sin_sum += rad.sin();
        cos_sum += rad.cos();
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some(sin_sum.atan2(cos_sum).to_degrees().rem_euclid(360.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn heading_follows_screen_compass() {
        assert!(close(Vector::new(0.0, -1.0).heading(), 0.0));
        assert!(close(Vector::new(-1.0, 0.0).heading(), 90.0));
        assert!(close(Vector::new(0.0, 1.0).heading(), 180.0));
        assert!(close(Vector::new(1.0, 0.0).heading(), 270.0));
        assert_eq!(Vector::ZERO.heading(), 0.0);
    }

    #[test]
    fn from_heading_inverts_heading() {
        for h in [0.0, 45.0, 135.0, 200.0, 315.0] {
            assert!(close(Vector::from_heading(h).heading(), h));
        }
    }

    #[test]
    fn angle_between_wraps() {
        assert!(close(angle_between(350.0, 10.0), 20.0));
        assert!(close(angle_between(0.0, 180.0), 180.0));
        assert!(close(angle_between(90.0, 90.0), 0.0));
    }

    #[test]
    fn circular_mean_handles_wraparound() {
        let mean = circular_mean([350.0, 10.0]).unwrap();
        assert!(angle_between(mean, 0.0) < 1e-3);
        assert!(circular_mean(std::iter::empty()).is_none());
    }

    #[test]
    fn clamp_is_per_component() {
        let v = Vector::new(10.0, -0.5).clamp_components(3.5);
        assert_eq!(v, Vector::new(3.5, -0.5));
    }

    #[test]
    fn serializes_as_a_pair() {
        let json = serde_json::to_string(&Vector::new(1.5, -2.0)).unwrap();
        assert_eq!(json, "[1.5,-2.0]");
        let back: Vector = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Vector::new(1.5, -2.0));
    }
}
