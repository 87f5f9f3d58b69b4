use glam::{Mat3, Vec2, Vec3};

const NEAR_PLANE: f32 = 0.1;
const MIN_DISTANCE: f32 = 6.0;
const MAX_DISTANCE: f32 = 120.0;
/// Slightly short of ±90° so the view never flips over the poles.
const MAX_PITCH: f32 = 1.45;
const ORBIT_SENSITIVITY: f32 = 0.008;
const FOV_Y_RADIANS: f32 = 60.0 * std::f32::consts::PI / 180.0;

/// Screen-space result of projecting one world point.
#[derive(Debug, Clone, Copy)]
pub struct Projected {
    pub screen: Vec2,
    /// Perspective factor: multiply a world-space size by this to get pixels.
    pub scale: f32,
    /// Distance from the camera along the view axis, for back-to-front sorting.
    pub depth: f32,
}

/// Orbit camera circling the level sphere's center.
///
/// Pure state plus projection math; the GUI feeds it drag and scroll deltas
/// and uses [`project`](Self::project) for both drawing and hit-testing.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    viewport: Vec2,
}

impl OrbitCamera {
    pub fn new(viewport_width: f32, viewport_height: f32) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance: 40.0,
            viewport: Vec2::new(viewport_width, viewport_height),
        }
    }

    pub fn update_viewport(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width, height);
    }

    /// Apply a pointer drag: horizontal motion spins around the vertical
    /// axis, vertical motion tilts, clamped short of the poles.
    pub fn orbit(&mut self, drag: Vec2) {
        self.yaw += drag.x * ORBIT_SENSITIVITY;
        self.pitch = (self.pitch + drag.y * ORBIT_SENSITIVITY).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Positive delta moves the camera closer.
    pub fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance - delta).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    fn view_rotation(&self) -> Mat3 {
        Mat3::from_rotation_x(self.pitch) * Mat3::from_rotation_y(self.yaw)
    }

    /// Project a world point to screen space. `None` when the point sits
    /// behind the near plane and must not be drawn or hit-tested.
    pub fn project(&self, world: Vec3) -> Option<Projected> {
        let view = self.view_rotation() * world;
        let depth = self.distance - view.z;
        if depth <= NEAR_PLANE {
            return None;
        }

        let focal = (self.viewport.y * 0.5) / (FOV_Y_RADIANS * 0.5).tan();
        let scale = focal / depth;
        let center = self.viewport * 0.5;

        Some(Projected {
            screen: center + Vec2::new(view.x, -view.y) * scale,
            scale,
            depth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_projects_to_viewport_center() {
        let camera = OrbitCamera::new(1000.0, 800.0);
        let projected = camera.project(Vec3::ZERO).unwrap();

        assert!((projected.screen.x - 500.0).abs() < 0.1);
        assert!((projected.screen.y - 400.0).abs() < 0.1);
        assert!(projected.scale > 0.0);
    }

    #[test]
    fn test_points_behind_the_camera_are_culled() {
        let camera = OrbitCamera::new(1000.0, 800.0);

        // Camera orbits at distance 40 on +z; a point beyond it is invisible.
        assert!(camera.project(Vec3::new(0.0, 0.0, 60.0)).is_none());
        assert!(camera.project(Vec3::new(0.0, 0.0, 10.0)).is_some());
    }

    #[test]
    fn test_nearer_points_appear_larger() {
        let camera = OrbitCamera::new(1000.0, 800.0);

        let near = camera.project(Vec3::new(0.0, 0.0, 18.0)).unwrap();
        let far = camera.project(Vec3::new(0.0, 0.0, -18.0)).unwrap();

        assert!(near.scale > far.scale);
        assert!(near.depth < far.depth);
    }

    #[test]
    fn test_up_in_world_is_up_on_screen() {
        let camera = OrbitCamera::new(1000.0, 800.0);

        let above = camera.project(Vec3::new(0.0, 5.0, 0.0)).unwrap();
        assert!(above.screen.y < 400.0);
    }

    #[test]
    fn test_yaw_swings_a_side_point_to_center() {
        let mut camera = OrbitCamera::new(1000.0, 800.0);
        let side = Vec3::new(10.0, 0.0, 0.0);

        let before = camera.project(side).unwrap();
        assert!(before.screen.x > 500.0);

        camera.yaw = std::f32::consts::FRAC_PI_2;
        let after = camera.project(side).unwrap();
        assert!((after.screen.x - 500.0).abs() < 0.1);
    }

    #[test]
    fn test_zoom_clamps_to_range() {
        let mut camera = OrbitCamera::new(1000.0, 800.0);

        camera.zoom(1000.0);
        assert_eq!(camera.distance, MIN_DISTANCE);

        camera.zoom(-1000.0);
        assert_eq!(camera.distance, MAX_DISTANCE);
    }

    #[test]
    fn test_pitch_clamps_short_of_the_poles() {
        let mut camera = OrbitCamera::new(1000.0, 800.0);

        camera.orbit(Vec2::new(0.0, 10_000.0));
        assert_eq!(camera.pitch, MAX_PITCH);

        camera.orbit(Vec2::new(0.0, -20_000.0));
        assert_eq!(camera.pitch, -MAX_PITCH);
    }
}
