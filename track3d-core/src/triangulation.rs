use crate::{Result, ScreenCoordinate};
use nalgebra::{Point3, Vector3};

/// A half-line leaving the optical center of a camera.
///
/// The direction is not normalized. Its length is meaningful for the plane intersection and
/// for the closest approach parameters, which are expressed in multiples of it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3<f64>,
    pub direction: Vector3<f64>,
}

impl Ray {
    pub fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Self {
        Self { origin, direction }
    }

    /// The point `origin + t * direction`.
    pub fn at(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction * t
    }
}

/// The result of reducing two rays to a single point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangulation {
    /// The reconstructed point.
    pub point: Point3<f64>,
    /// The distance between the two points that were merged into `point`. This is zero
    /// when the rays intersect exactly.
    pub residual: f64,
}

/// Allows conversion between screen coordinates and the rays they were observed along.
pub trait CameraModel {
    /// The ray from the camera through the detection at `coordinate`.
    fn ray(&self, coordinate: ScreenCoordinate) -> Ray;

    /// The screen coordinate at which `point` would be detected.
    ///
    /// This is fallible, since points behind the camera are never seen.
    fn screen_coordinate(&self, point: Point3<f64>) -> Result<ScreenCoordinate>;
}

/// Algorithms which reduce the two rays of a synchronized detection pair to one point.
pub trait RayTriangulator {
    fn triangulate(&self, a: &Ray, b: &Ray) -> Result<Triangulation>;
}

impl<T> RayTriangulator for &T
where
    T: RayTriangulator + ?Sized,
{
    fn triangulate(&self, a: &Ray, b: &Ray) -> Result<Triangulation> {
        (**self).triangulate(a, b)
    }
}
