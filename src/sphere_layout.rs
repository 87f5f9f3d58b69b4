use glam::Vec3;

/// Golden-angle increment between consecutive points, in radians.
const GOLDEN_ANGLE: f32 = std::f32::consts::PI * (3.0 - 2.236_068);

/// Distribute `samples` points evenly over a sphere of the given radius
/// using the golden-angle spiral.
///
/// Point `i` always lands on the same position for a given `samples`, so a
/// level's children keep stable anchors as long as their order is stable,
/// which the tree guarantees (folders sorted first, then images).
pub fn fibonacci_sphere(samples: usize, radius: f32) -> Vec<Vec3> {
    if samples == 0 {
        return Vec::new();
    }

    let offset = 2.0 / samples as f32;
    let mut points = Vec::with_capacity(samples);

    for i in 0..samples {
        let y = i as f32 * offset - 1.0 + offset / 2.0;
        let ring = (1.0 - y * y).max(0.0).sqrt();
        let phi = i as f32 * GOLDEN_ANGLE;

        points.push(Vec3::new(phi.cos() * ring, y, phi.sin() * ring) * radius);
    }

    points
}
