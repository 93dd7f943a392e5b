use glam::{DMat4, DVec2, DVec3, DVec4};
use std::f64::consts::PI;

/// Identifies one click-started camera animation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AnimationId(u64);

/// Terminal viewport in character cells
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
    /// Height of one cell divided by its width
    pub cell_aspect: f64,
}

impl Viewport {
    pub fn new(width: u16, height: u16, cell_aspect: f64) -> Self {
        Viewport {
            width,
            height,
            cell_aspect,
        }
    }

    /// Width over height in visual units, correcting for tall cells
    pub fn aspect(&self) -> f64 {
        self.width.max(1) as f64 / (self.height.max(1) as f64 * self.cell_aspect)
    }

    /// Maps normalized device coordinates to cell coordinates
    pub fn to_screen(&self, ndc: DVec2) -> DVec2 {
        DVec2::new(
            (ndc.x + 1.0) * 0.5 * self.width as f64,
            (1.0 - ndc.y) * 0.5 * self.height as f64,
        )
    }
}

/// A world point after projection
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projected {
    pub screen: DVec2,
    /// Distance in front of the camera along its view direction
    pub depth: f64,
}

/// Shared camera state handed to everything that moves or reads the camera.
///
/// Orientation is stored as a forward direction, so moving the camera keeps
/// it facing the same way until the next `look_at`.
#[derive(Clone, Debug)]
pub struct CameraController {
    position: DVec3,
    forward: DVec3,
    pub fov_degrees: f64,
    pub near: f64,
    pub far: f64,
    generation: u64,
}

impl CameraController {
    pub fn new(position: DVec3, look_at: DVec3, fov_degrees: f64) -> Self {
        let mut camera = CameraController {
            position,
            forward: DVec3::NEG_Z,
            fov_degrees,
            near: 0.1,
            far: 1000.0,
            generation: 0,
        };
        camera.look_at(look_at);
        camera
    }

    /// Current camera position
    pub fn position(&self) -> DVec3 {
        self.position
    }

    /// Moves the camera without turning it
    pub fn set_position(&mut self, position: DVec3) {
        self.position = position;
    }

    /// Unit view direction
    pub fn forward(&self) -> DVec3 {
        self.forward
    }

    /// Turns the camera so `target` is centered. A target at the camera
    /// position leaves the orientation unchanged.
    pub fn look_at(&mut self, target: DVec3) {
        let direction = target - self.position;
        if direction.length_squared() > f64::EPSILON {
            self.forward = direction.normalize();
        }
    }

    /// Starts a new animation, invalidating every earlier id
    pub fn begin_animation(&mut self) -> AnimationId {
        self.generation += 1;
        AnimationId(self.generation)
    }

    /// Whether `id` belongs to the most recently started animation
    pub fn is_current(&self, id: AnimationId) -> bool {
        id.0 == self.generation
    }

    /// World up, swapped out when looking straight up or down
    fn up(&self) -> DVec3 {
        if self.forward.dot(DVec3::Y).abs() > 0.999 {
            DVec3::Z
        } else {
            DVec3::Y
        }
    }

    /// World to view transform
    pub fn view_matrix(&self) -> DMat4 {
        DMat4::look_to_rh(self.position, self.forward, self.up())
    }

    /// Perspective projection for the viewport's aspect ratio
    pub fn projection_matrix(&self, viewport: &Viewport) -> DMat4 {
        DMat4::perspective_rh(
            self.fov_degrees.to_radians(),
            viewport.aspect(),
            self.near,
            self.far,
        )
    }

    /// Projects a world point into cell coordinates. Points behind the near
    /// plane are not projected.
    pub fn project(&self, point: DVec3, viewport: &Viewport) -> Option<Projected> {
        let view = self.view_matrix() * point.extend(1.0);
        let depth = -view.z;
        if depth < self.near {
            return None;
        }
        let clip: DVec4 = self.projection_matrix(viewport) * view;
        let ndc = DVec2::new(clip.x / clip.w, clip.y / clip.w);
        Some(Projected {
            screen: viewport.to_screen(ndc),
            depth,
        })
    }
}

impl Default for CameraController {
    fn default() -> Self {
        CameraController::new(DVec3::new(0.0, 0.0, 5.0), DVec3::ZERO, 75.0)
    }
}

const POLAR_EPSILON: f64 = 1e-6;

/// Rotates and zooms the camera around a pivot point
#[derive(Clone, Debug)]
pub struct OrbitControls {
    /// Pivot the camera orbits around and looks at
    pub target: DVec3,
    pub min_distance: f64,
    pub max_distance: f64,
    /// Radians per cell of drag
    pub rotate_speed: f64,
    pending_azimuth: f64,
    pending_polar: f64,
    pending_scale: f64,
}

impl Default for OrbitControls {
    fn default() -> Self {
        OrbitControls {
            target: DVec3::ZERO,
            min_distance: 0.0,
            max_distance: f64::INFINITY,
            rotate_speed: 0.05,
            pending_azimuth: 0.0,
            pending_polar: 0.0,
            pending_scale: 1.0,
        }
    }
}

impl OrbitControls {
    pub fn new(target: DVec3) -> Self {
        OrbitControls {
            target,
            ..Default::default()
        }
    }

    /// Queues a drag of `dx`, `dy` cells; applied on the next `update`
    pub fn rotate(&mut self, dx: f64, dy: f64) {
        self.pending_azimuth -= dx * self.rotate_speed;
        self.pending_polar -= dy * self.rotate_speed;
    }

    /// Queues a zoom; factors below 1 move the camera closer
    pub fn dolly(&mut self, factor: f64) {
        self.pending_scale *= factor;
    }

    /// Whether a drag or zoom is waiting for the next `update`
    pub fn has_pending_input(&self) -> bool {
        self.pending_azimuth != 0.0 || self.pending_polar != 0.0 || self.pending_scale != 1.0
    }

    /// Re-derives the camera position from its spherical offset around the
    /// target, applies pending input and turns the camera to the target.
    pub fn update(&mut self, camera: &mut CameraController) {
        let offset = camera.position() - self.target;
        let radius = offset.length();

        if radius > f64::EPSILON {
            let mut theta = offset.x.atan2(offset.z);
            let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

            theta += self.pending_azimuth;
            phi = (phi + self.pending_polar).clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
            let radius = (radius * self.pending_scale).clamp(self.min_distance, self.max_distance);

            let sin_phi = phi.sin();
            let offset = DVec3::new(
                radius * sin_phi * theta.sin(),
                radius * phi.cos(),
                radius * sin_phi * theta.cos(),
            );
            camera.set_position(self.target + offset);
        }

        camera.look_at(self.target);
        self.pending_azimuth = 0.0;
        self.pending_polar = 0.0;
        self.pending_scale = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport::new(80, 40, 2.0)
    }

    #[test]
    fn look_at_centers_the_target() {
        let camera = CameraController::new(DVec3::new(3.0, 2.0, 1.0), DVec3::ZERO, 60.0);
        let projected = camera.project(DVec3::ZERO, &viewport()).unwrap();
        assert!((projected.screen - DVec2::new(40.0, 20.0)).length() < 1e-9);
        assert!((projected.depth - DVec3::new(3.0, 2.0, 1.0).length()).abs() < 1e-9);
    }

    #[test]
    fn points_behind_the_camera_are_not_projected() {
        let camera = CameraController::default();
        assert!(camera.project(DVec3::new(0.0, 0.0, 10.0), &viewport()).is_none());
    }

    #[test]
    fn moving_keeps_orientation_until_next_look_at() {
        let mut camera = CameraController::default();
        let before = camera.forward();
        camera.set_position(DVec3::new(1.0, 1.0, 1.0));
        assert_eq!(camera.forward(), before);
        camera.look_at(DVec3::new(1.0, 1.0, 0.0));
        assert!((camera.forward() - DVec3::NEG_Z).length() < 1e-12);
    }

    #[test]
    fn look_at_own_position_keeps_orientation() {
        let mut camera = CameraController::default();
        let before = camera.forward();
        camera.look_at(camera.position());
        assert_eq!(camera.forward(), before);
    }

    #[test]
    fn new_animation_invalidates_previous_one() {
        let mut camera = CameraController::default();
        let first = camera.begin_animation();
        assert!(camera.is_current(first));
        let second = camera.begin_animation();
        assert!(!camera.is_current(first));
        assert!(camera.is_current(second));
    }

    #[test]
    fn orbit_update_without_input_keeps_position() {
        let mut camera = CameraController::new(DVec3::new(2.0, 1.0, -3.0), DVec3::ZERO, 75.0);
        let mut orbit = OrbitControls {
            target: DVec3::new(0.0, 1.0, 0.0),
            ..Default::default()
        };
        orbit.update(&mut camera);
        assert!((camera.position() - DVec3::new(2.0, 1.0, -3.0)).length() < 1e-9);
        let expected = (orbit.target - camera.position()).normalize();
        assert!((camera.forward() - expected).length() < 1e-9);
    }

    #[test]
    fn orbit_rotation_keeps_distance_to_target() {
        let mut camera = CameraController::default();
        let mut orbit = OrbitControls::default();
        orbit.rotate(10.0, -4.0);
        assert!(orbit.has_pending_input());
        orbit.update(&mut camera);
        assert!(!orbit.has_pending_input());
        assert!((camera.position().length() - 5.0).abs() < 1e-9);
        assert!(camera.position().x.abs() > 0.1);
    }

    #[test]
    fn orbit_dolly_respects_min_distance() {
        let mut camera = CameraController::default();
        let mut orbit = OrbitControls {
            min_distance: 2.0,
            ..Default::default()
        };
        orbit.dolly(0.1);
        orbit.update(&mut camera);
        assert!((camera.position().length() - 2.0).abs() < 1e-9);
    }
}
