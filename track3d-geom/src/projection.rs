use track3d_core::{
    nalgebra::{Point3, Vector3},
    CameraConfig, CameraModel, CameraSlot, CameraSystem, Error, Orientation, Ray, Result,
    ScreenCoordinate,
};

/// The orthonormal basis spanned by a camera orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBasis {
    /// The view direction `n`.
    pub forward: Vector3<f64>,
    /// The horizontal screen axis `a`, pointing right.
    pub right: Vector3<f64>,
    /// The vertical screen axis `b`, pointing up.
    pub up: Vector3<f64>,
}

impl ViewBasis {
    pub fn new(orientation: Orientation) -> Self {
        let (sin_theta, cos_theta) = orientation.theta.sin_cos();
        let (sin_phi, cos_phi) = orientation.phi.sin_cos();
        Self {
            forward: Vector3::new(cos_phi * cos_theta, sin_phi * cos_theta, sin_theta),
            right: Vector3::new(sin_phi, -cos_phi, 0.0),
            up: Vector3::new(-cos_phi * sin_theta, -sin_phi * sin_theta, cos_theta),
        }
    }
}

/// The orientation that points the view direction from `from` towards `to`.
///
/// Useful to produce a first guess for a camera aimed at a known spot.
pub fn look_at(from: Point3<f64>, to: Point3<f64>) -> Orientation {
    let v = to - from;
    Orientation::new(v.z.atan2(v.xy().norm()), v.y.atan2(v.x))
}

/// Intersects `ray` with the horizontal plane `z = z0`.
///
/// The intersection parameter is not restricted to be positive, so a ray pointing away from the
/// plane still produces the point behind the camera. This keeps the calibration loss smooth far
/// from the solution.
pub fn intersect_plane(ray: &Ray, z0: f64) -> Result<Point3<f64>> {
    if ray.direction.z == 0.0 {
        return Err(Error::ParallelToPlane { z0 });
    }
    let point = ray.at((z0 - ray.origin.z) / ray.direction.z);
    if point.coords.iter().all(|n| n.is_finite()) {
        Ok(point)
    } else {
        Err(Error::ParallelToPlane { z0 })
    }
}

/// A single camera with a fixed orientation, turning screen coordinates into rays and back.
///
/// ```
/// use track3d_core::{nalgebra::Point3, CameraConfig, CameraModel};
/// use track3d_geom::{look_at, Projector};
///
/// let position = Point3::new(0.0, 0.0, 6.0);
/// let target = Point3::new(10.0, 22.0, 0.0);
/// let camera = Projector::new(look_at(position, target), CameraConfig::new(1.0, 1.5, position));
///
/// let coordinate = camera.screen_coordinate(target).unwrap();
/// assert!(coordinate.p().abs() < 1e-12 && coordinate.q().abs() < 1e-12);
/// let hit = camera.project_to_plane(coordinate, 0.0).unwrap();
/// assert!((hit - target).norm() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    orientation: Orientation,
    config: CameraConfig,
    basis: ViewBasis,
}

impl Projector {
    pub fn new(orientation: Orientation, config: CameraConfig) -> Self {
        Self {
            orientation,
            config,
            basis: ViewBasis::new(orientation),
        }
    }

    /// The camera in `slot` of a camera system.
    pub fn from_system(system: &CameraSystem, slot: CameraSlot) -> Self {
        Self::new(system.orientation(slot), system.camera(slot))
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn config(&self) -> CameraConfig {
        self.config
    }

    pub fn basis(&self) -> &ViewBasis {
        &self.basis
    }

    /// Casts the ray through `coordinate` and intersects it with the plane `z = z0`.
    pub fn project_to_plane(&self, coordinate: ScreenCoordinate, z0: f64) -> Result<Point3<f64>> {
        intersect_plane(&self.ray(coordinate), z0)
    }

    /// The corners of the lower half of the frame projected onto the plane `z = z0`, in the
    /// order bottom left, bottom right, middle right, middle left.
    ///
    /// This outlines the ground area the camera looks at.
    pub fn footprint(&self, z0: f64) -> Result<[Point3<f64>; 4]> {
        let corners = [
            ScreenCoordinate::new(-0.5, -0.5),
            ScreenCoordinate::new(0.5, -0.5),
            ScreenCoordinate::new(0.5, 0.0),
            ScreenCoordinate::new(-0.5, 0.0),
        ];
        let mut footprint = [Point3::origin(); 4];
        for (point, &corner) in footprint.iter_mut().zip(corners.iter()) {
            *point = self.project_to_plane(corner, z0)?;
        }
        Ok(footprint)
    }
}

impl CameraModel for Projector {
    fn ray(&self, coordinate: ScreenCoordinate) -> Ray {
        let ViewBasis { forward, right, up } = self.basis;
        let direction = forward * self.config.k
            + right * coordinate.p()
            + up * (coordinate.q() / self.config.r);
        Ray::new(self.config.position, direction)
    }

    fn screen_coordinate(&self, point: Point3<f64>) -> Result<ScreenCoordinate> {
        let v = point - self.config.position;
        let depth = v.dot(&self.basis.forward);
        if depth <= 0.0 || !depth.is_finite() {
            return Err(Error::BehindCamera);
        }
        let scale = self.config.k / depth;
        Ok(ScreenCoordinate::new(
            scale * v.dot(&self.basis.right),
            self.config.r * scale * v.dot(&self.basis.up),
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;
    use track3d_core::nalgebra;

    fn camera() -> Projector {
        let position = Point3::new(25.0, 5.0, 8.0);
        Projector::new(
            look_at(position, Point3::new(10.0, 22.0, 0.0)),
            CameraConfig::new(1.2, 16.0 / 9.0, position),
        )
    }

    #[quickcheck]
    fn basis_is_orthonormal(theta: f64, phi: f64) -> TestResult {
        if !theta.is_finite() || !phi.is_finite() {
            return TestResult::discard();
        }
        let ViewBasis { forward, right, up } = ViewBasis::new(Orientation::new(theta, phi));
        let close = |a: f64, b: f64| (a - b).abs() < 1e-9;
        TestResult::from_bool(
            close(forward.norm(), 1.0)
                && close(right.norm(), 1.0)
                && close(up.norm(), 1.0)
                && close(forward.dot(&right), 0.0)
                && close(forward.dot(&up), 0.0)
                && close(right.dot(&up), 0.0),
        )
    }

    #[test]
    fn level_camera_axes() {
        let basis = ViewBasis::new(Orientation::new(0.0, 0.0));
        assert_relative_eq!(basis.forward, Vector3::x());
        assert_relative_eq!(basis.right, -Vector3::y());
        assert_relative_eq!(basis.up, Vector3::z());
    }

    #[quickcheck]
    fn back_projection_inverts_ray(p: i8, q: i8, depth: u8) -> bool {
        let camera = camera();
        let coordinate = ScreenCoordinate::new(p as f64 / 256.0, q as f64 / 256.0);
        let point = camera.ray(coordinate).at(1.0 + depth as f64);
        let restored = camera.screen_coordinate(point).unwrap();
        (restored.p() - coordinate.p()).abs() < 1e-9 && (restored.q() - coordinate.q()).abs() < 1e-9
    }

    #[test]
    fn points_behind_are_not_seen() {
        let camera = camera();
        let behind = camera.ray(ScreenCoordinate::center()).at(-2.0);
        assert_eq!(camera.screen_coordinate(behind), Err(Error::BehindCamera));
    }

    #[test]
    fn plane_projection_lands_on_plane() {
        let camera = camera();
        let point = camera
            .project_to_plane(ScreenCoordinate::new(0.2, -0.1), 1.5)
            .unwrap();
        assert_relative_eq!(point.z, 1.5);
    }

    #[test]
    fn level_ray_never_reaches_plane() {
        let position = Point3::new(0.0, 0.0, 5.0);
        let camera = Projector::new(
            Orientation::new(0.0, 0.3),
            CameraConfig::new(1.0, 1.0, position),
        );
        assert_eq!(
            camera.project_to_plane(ScreenCoordinate::new(0.3, 0.0), 0.0),
            Err(Error::ParallelToPlane { z0: 0.0 })
        );
    }

    #[test]
    fn footprint_widens_away_from_camera() {
        let camera = camera();
        let [bottom_left, bottom_right, middle_right, middle_left] = camera.footprint(0.0).unwrap();
        for corner in [bottom_left, bottom_right, middle_right, middle_left] {
            assert_relative_eq!(corner.z, 0.0);
        }
        let near = (bottom_right - bottom_left).norm();
        let far = (middle_right - middle_left).norm();
        assert!(far > near);
        // The middle of the frame is the view direction, which hits the look-at target.
        let center = nalgebra::center(&middle_left, &middle_right);
        assert_relative_eq!(center, Point3::new(10.0, 22.0, 0.0), epsilon = 1e-9);
    }
}
