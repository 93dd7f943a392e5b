use crate::math::{get_vec3, Vec3Input};
use crate::spring::{Spring, SpringConfig};
use glam::{DMat4, DQuat, DVec2, DVec3, EulerRot};

const INACTIVE_SCALE: f64 = 1.0;
const ACTIVE_SCALE: f64 = 1.5;

/// Cube that spins every frame and grows with a spring when clicked
#[derive(Clone, Debug)]
pub struct SpinningBox {
    pub position: DVec3,
    pub color: [u8; 3],
    /// Rotation angles around the X and Y axes, in radians
    rotation: DVec2,
    active: bool,
    scale: Spring,
}

impl SpinningBox {
    pub fn new(position: impl Into<Vec3Input>, color: [u8; 3], spring: SpringConfig) -> Self {
        SpinningBox {
            position: get_vec3(position),
            color,
            rotation: DVec2::ZERO,
            active: false,
            scale: Spring::new(INACTIVE_SCALE, spring),
        }
    }

    /// Advances both rotation angles by the frame time and steps the scale spring.
    /// Angles grow without wrapping.
    pub fn on_frame(&mut self, elapsed_seconds: f64) {
        self.rotation += DVec2::splat(elapsed_seconds);
        self.scale.advance(elapsed_seconds);
    }

    /// Toggles the active flag and retargets the scale spring
    pub fn on_click(&mut self) {
        self.active = !self.active;
        let target = if self.active {
            ACTIVE_SCALE
        } else {
            INACTIVE_SCALE
        };
        self.scale.set_target(target);
        log::info!("box active={} scale -> {target}", self.active);
    }

    /// Accumulated rotation around x and y, in radians
    pub fn rotation(&self) -> DVec2 {
        self.rotation
    }

    /// Whether the last click left the cube enlarged
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Current spring-driven scale
    pub fn scale(&self) -> f64 {
        self.scale.value()
    }

    /// Object to world transform with the current scale and rotation
    pub fn model_matrix(&self) -> DMat4 {
        let rotation = DQuat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, 0.0);
        DMat4::from_scale_rotation_translation(DVec3::splat(self.scale()), rotation, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spring::SpringPreset;

    fn spinner() -> SpinningBox {
        SpinningBox::new([0.0, 0.0, 0.0], [255, 105, 180], SpringPreset::Wobbly.config())
    }

    #[test]
    fn rotation_accumulates_elapsed_time_on_both_axes() {
        let mut cube = spinner();
        let mut previous = cube.rotation();
        for elapsed in [0.016, 0.5, 0.001, 3.0] {
            cube.on_frame(elapsed);
            let current = cube.rotation();
            assert!(current.x > previous.x && current.y > previous.y);
            previous = current;
        }
        assert!((previous.x - 3.517).abs() < 1e-12);
        assert_eq!(previous.x, previous.y);
    }

    #[test]
    fn rotation_never_wraps() {
        let mut cube = spinner();
        for _ in 0..100 {
            cube.on_frame(0.1);
        }
        assert!(cube.rotation().x > std::f64::consts::TAU);
    }

    #[test]
    fn click_alternates_active_from_false() {
        let mut cube = spinner();
        assert!(!cube.is_active());
        let states: Vec<bool> = (0..4)
            .map(|_| {
                cube.on_click();
                cube.is_active()
            })
            .collect();
        assert_eq!(states, [true, false, true, false]);
    }

    #[test]
    fn active_box_springs_to_larger_scale() {
        let mut cube = spinner();
        cube.on_click();
        for _ in 0..600 {
            cube.on_frame(1.0 / 60.0);
        }
        assert!((cube.scale() - 1.5).abs() < 1e-3);

        cube.on_click();
        for _ in 0..600 {
            cube.on_frame(1.0 / 60.0);
        }
        assert!((cube.scale() - 1.0).abs() < 1e-3);
    }
}
