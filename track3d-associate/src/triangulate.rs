use average::Mean;
use track3d_core::{
    nalgebra::Point3, sync, union_span, CameraModel, CameraSlot, CameraSystem, Error, FrameSpan,
    MatchResult, RayTriangulator, Result, SyncedWindow, Track,
};
use track3d_geom::{ClosestApproachTriangulator, Projector};

/// Reconstructs the 3d path of a track pair with calibrated cameras.
///
/// On frames seen by both cameras the point is the midpoint of the closest approach of both
/// rays. On frames seen by a single camera the depth is unobservable, so the ray is intersected
/// with the plane `z = z0` instead. The two kinds of points rest on different assumptions and the
/// path may jump where it passes from one to the other.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathTriangulator {
    first: Projector,
    second: Projector,
    triangulator: ClosestApproachTriangulator,
    z0: f64,
}

impl PathTriangulator {
    pub fn new(system: &CameraSystem, z0: f64) -> Self {
        Self {
            first: Projector::from_system(system, CameraSlot::First),
            second: Projector::from_system(system, CameraSlot::Second),
            triangulator: ClosestApproachTriangulator::new(),
            z0,
        }
    }

    /// Set the triangulator used on frames seen by both cameras.
    #[must_use]
    pub fn triangulator(self, triangulator: ClosestApproachTriangulator) -> Self {
        Self {
            triangulator,
            ..self
        }
    }

    /// The height of the plane used on frames seen by a single camera.
    pub fn z0(&self) -> f64 {
        self.z0
    }

    /// The mean closest approach residual over a synchronized window.
    pub fn loss(&self, window: &SyncedWindow) -> Result<f64> {
        let mean: Mean = window
            .pairs()
            .map(|(a, b)| {
                self.triangulator
                    .triangulate(&self.first.ray(a), &self.second.ray(b))
                    .map(|triangulation| triangulation.residual)
            })
            .collect::<Result<Mean>>()?;
        Ok(mean.mean())
    }

    /// The point on `frame`, using whichever cameras saw the subject.
    pub fn point(&self, frame: usize, first: &Track, second: &Track) -> Result<Point3<f64>> {
        match (first.get(frame), second.get(frame)) {
            (Some(a), Some(b)) => Ok(self
                .triangulator
                .triangulate(&self.first.ray(a), &self.second.ray(b))?
                .point),
            (Some(a), None) => self.first.project_to_plane(a, self.z0),
            (None, Some(b)) => self.second.project_to_plane(b, self.z0),
            (None, None) => Err(Error::NoOverlap {
                first: first.span(),
                second: second.span(),
            }),
        }
    }

    /// The points on every frame seen by at least one of the cameras.
    ///
    /// Both tracks must overlap, otherwise the union of their spans has a gap.
    pub fn path(&self, first: &Track, second: &Track) -> Result<(FrameSpan, Vec<Point3<f64>>)> {
        let span = union_span(first, second);
        let points = span
            .frames()
            .map(|frame| self.point(frame, first, second))
            .collect::<Result<Vec<_>>>()?;
        Ok((span, points))
    }

    /// Reconstructs the pair formed by track `i` of the first camera and track `j` of the
    /// second camera.
    ///
    /// Errors identify the pair.
    pub fn triangulate(
        &self,
        i: usize,
        first: &Track,
        j: usize,
        second: &Track,
    ) -> Result<MatchResult> {
        let reconstruct = || -> Result<MatchResult> {
            let window = sync(first, second)?;
            let loss = self.loss(&window)?;
            let (span, points) = self.path(first, second)?;
            Ok(MatchResult {
                i,
                j,
                loss,
                span,
                points,
            })
        };
        reconstruct().map_err(|e| e.for_pair(i, j))
    }
}
