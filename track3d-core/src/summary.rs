use crate::{CameraSlot, CameraSystem};
use nalgebra::Vector3;

/// A camera pose expressed the way 3d engines usually take it, for placing a virtual camera
/// that matches a calibrated one.
///
/// Engines tend to be Y-up, so the position is `(x, z, y)` of the world position. The
/// rotation is in degrees around the engine's X (pitch), Y (yaw) and Z (roll) axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSummary {
    pub position: Vector3<f64>,
    pub rotation_degrees: Vector3<f64>,
    pub horizontal_fov_degrees: f64,
    pub vertical_fov_degrees: f64,
    pub aspect_ratio: f64,
}

impl CameraSummary {
    pub fn new(system: &CameraSystem, slot: CameraSlot) -> Self {
        let config = system.camera(slot);
        let orientation = system.orientation(slot);
        let position = config.position;
        // The frame extends 0.5 horizontally and 0.5 / r vertically at distance k.
        let horizontal_fov = 2.0 * (0.5 / config.k).atan();
        let vertical_fov = 2.0 * (0.5 / (config.r * config.k)).atan();
        Self {
            position: Vector3::new(position.x, position.z, position.y),
            rotation_degrees: Vector3::new(
                -orientation.theta.to_degrees(),
                90.0 - orientation.phi.to_degrees(),
                0.0,
            ),
            horizontal_fov_degrees: horizontal_fov.to_degrees(),
            vertical_fov_degrees: vertical_fov.to_degrees(),
            aspect_ratio: config.r,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{CameraConfig, CameraParams, RigConfig};
    use nalgebra::Point3;

    #[test]
    fn swaps_to_y_up_and_converts_angles() {
        let config = RigConfig::new(
            CameraConfig::new(0.5, 1.0, Point3::new(1.0, 2.0, 3.0)),
            CameraConfig::new(1.0, 16.0 / 9.0, Point3::new(0.0, 0.0, 5.0)),
        );
        let params = CameraParams::new(-0.25 * core::f64::consts::PI, 0.0, 0.0, 0.0, 0.0);
        let system = CameraSystem::new(config).with_params(params);

        let first = CameraSummary::new(&system, CameraSlot::First);
        assert_eq!(first.position, Vector3::new(1.0, 3.0, 2.0));
        assert!((first.rotation_degrees.x - 45.0).abs() < 1e-9);
        assert!((first.rotation_degrees.y - 90.0).abs() < 1e-9);
        // With k = 0.5 the frame edge is at 45 degrees.
        assert!((first.horizontal_fov_degrees - 90.0).abs() < 1e-9);
        assert!((first.vertical_fov_degrees - 90.0).abs() < 1e-9);

        let second = CameraSummary::new(&system, CameraSlot::Second);
        assert!(second.vertical_fov_degrees < second.horizontal_fov_degrees);
        assert_eq!(second.aspect_ratio, 16.0 / 9.0);
    }
}
