use crate::intersect_plane;
use track3d_core::{nalgebra, Error, Ray, RayTriangulator, Result, Triangulation};

/// Reduces two rays to the midpoint of their points of closest approach.
///
/// This solves the 2x2 normal equations minimizing `|(C1 + t1 * d1) - (C2 + t2 * d2)|` for
/// `(t1, t2)`. The residual is the distance between the two closest points, which is zero
/// when the rays actually intersect.
///
/// The system becomes singular as the rays become parallel. Rather than testing the raw
/// determinant `(d1 . d1)(d2 . d2) - (d1 . d2)^2`, which scales with the ray lengths, the
/// determinant is divided by `(d1 . d1)(d2 . d2)`. That is `sin^2` of the angle between the
/// rays, and the system is rejected when it falls below the epsilon.
///
/// ```
/// use track3d_core::{nalgebra::{Point3, Vector3}, Ray, RayTriangulator};
/// use track3d_geom::ClosestApproachTriangulator;
///
/// let point = Point3::new(3.0, 4.0, 1.0);
/// let a = Ray::new(Point3::new(0.0, 0.0, 6.0), point - Point3::new(0.0, 0.0, 6.0));
/// let b = Ray::new(Point3::new(25.0, 5.0, 8.0), (point - Point3::new(25.0, 5.0, 8.0)) * 0.1);
/// let triangulation = ClosestApproachTriangulator::new().triangulate(&a, &b).unwrap();
/// assert!((triangulation.point - point).norm() < 1e-9);
/// assert!(triangulation.residual < 1e-9);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
pub struct ClosestApproachTriangulator {
    epsilon: f64,
}

impl ClosestApproachTriangulator {
    /// Creates a `ClosestApproachTriangulator` with default values.
    ///
    /// Same as calling [`Default::default`].
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the smallest relative determinant (squared sine of the angle between the rays)
    /// accepted as invertible.
    ///
    /// Default is `1e-12`.
    #[must_use]
    pub fn epsilon(self, epsilon: f64) -> Self {
        Self { epsilon }
    }
}

impl Default for ClosestApproachTriangulator {
    fn default() -> Self {
        Self { epsilon: 1e-12 }
    }
}

impl RayTriangulator for ClosestApproachTriangulator {
    fn triangulate(&self, a: &Ray, b: &Ray) -> Result<Triangulation> {
        let (d1, d2) = (&a.direction, &b.direction);
        let w = a.origin - b.origin;
        let aa = d1.dot(d1);
        let ab = d1.dot(d2);
        let bb = d2.dot(d2);
        let e = d1.dot(&w);
        let f = d2.dot(&w);

        let determinant = aa * bb - ab * ab;
        let relative = determinant / (aa * bb);
        // Also catches zero-length directions, which produce NaN.
        if !(relative >= self.epsilon) {
            return Err(Error::SingularSystem {
                determinant: relative,
            });
        }

        let t1 = (ab * f - bb * e) / determinant;
        let t2 = (aa * f - ab * e) / determinant;
        let p1 = a.at(t1);
        let p2 = b.at(t2);
        Ok(Triangulation {
            point: nalgebra::center(&p1, &p2),
            residual: nalgebra::distance(&p1, &p2),
        })
    }
}

/// Reduces two rays to the midpoint of their intersections with the plane `z = z0`.
///
/// This is only exact when the subject is at height `z0`, but it is cheap and stays well
/// behaved for arbitrarily bad camera parameters, which is what calibration needs.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
pub struct PlaneTriangulator {
    z0: f64,
}

impl PlaneTriangulator {
    pub fn new(z0: f64) -> Self {
        Self { z0 }
    }

    pub fn z0(&self) -> f64 {
        self.z0
    }
}

impl Default for PlaneTriangulator {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl RayTriangulator for PlaneTriangulator {
    fn triangulate(&self, a: &Ray, b: &Ray) -> Result<Triangulation> {
        let p1 = intersect_plane(a, self.z0)?;
        let p2 = intersect_plane(b, self.z0)?;
        Ok(Triangulation {
            point: nalgebra::center(&p1, &p2),
            residual: nalgebra::distance(&p1, &p2),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use track3d_core::nalgebra::{Point3, Vector3};

    #[test]
    fn skew_rays_meet_halfway() {
        // Two horizontal lines crossing above each other at a vertical distance of 2.
        let a = Ray::new(Point3::new(-5.0, 0.0, 1.0), Vector3::new(1.0, 0.0, 0.0));
        let b = Ray::new(Point3::new(0.0, 7.0, 3.0), Vector3::new(0.0, -2.0, 0.0));
        let triangulation = ClosestApproachTriangulator::new()
            .triangulate(&a, &b)
            .unwrap();
        assert_relative_eq!(triangulation.point, Point3::new(0.0, 0.0, 2.0), epsilon = 1e-12);
        assert_relative_eq!(triangulation.residual, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn order_of_rays_does_not_matter() {
        let a = Ray::new(Point3::new(0.0, 0.0, 6.0), Vector3::new(0.3, 0.8, -0.5));
        let b = Ray::new(Point3::new(25.0, 5.0, 8.0), Vector3::new(-0.6, 0.5, -0.4));
        let triangulator = ClosestApproachTriangulator::new();
        let ab = triangulator.triangulate(&a, &b).unwrap();
        let ba = triangulator.triangulate(&b, &a).unwrap();
        assert_relative_eq!(ab.point, ba.point, epsilon = 1e-9);
        assert_relative_eq!(ab.residual, ba.residual, epsilon = 1e-9);
    }

    #[test]
    fn parallel_rays_are_singular() {
        let a = Ray::new(Point3::new(0.0, 0.0, 6.0), Vector3::new(1.0, 2.0, -1.0));
        let b = Ray::new(Point3::new(3.0, 0.0, 6.0), Vector3::new(2.0, 4.0, -2.0));
        assert!(matches!(
            ClosestApproachTriangulator::new().triangulate(&a, &b),
            Err(Error::SingularSystem { .. })
        ));
    }

    #[test]
    fn degenerate_direction_is_singular() {
        let a = Ray::new(Point3::new(0.0, 0.0, 6.0), Vector3::zeros());
        let b = Ray::new(Point3::new(3.0, 0.0, 6.0), Vector3::new(2.0, 4.0, -2.0));
        assert!(matches!(
            ClosestApproachTriangulator::new().triangulate(&a, &b),
            Err(Error::SingularSystem { .. })
        ));
    }

    #[test]
    fn plane_midpoint() {
        let a = Ray::new(Point3::new(0.0, 0.0, 4.0), Vector3::new(1.0, 0.0, -1.0));
        let b = Ray::new(Point3::new(10.0, 0.0, 2.0), Vector3::new(-1.0, 1.0, -1.0));
        let triangulation = PlaneTriangulator::new(0.0).triangulate(&a, &b).unwrap();
        // The rays land on (4, 0, 0) and (8, 2, 0).
        assert_relative_eq!(triangulation.point, Point3::new(6.0, 1.0, 0.0));
        assert_relative_eq!(triangulation.residual, 20.0f64.sqrt());
    }
}
