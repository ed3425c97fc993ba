use track3d_core::{
    nalgebra::Vector3, CalibrationSettings, CameraModel, CameraParams, CameraSlot, Error,
    RayTriangulator, Result, RigConfig, ScreenCoordinate, SyncedWindow,
};
use track3d_geom::{PlaneTriangulator, Projector};

/// The calibration loss of a reference window: the distance between the plane projections
/// of both cameras, summed over every synchronized frame.
#[derive(Debug, Clone, Copy)]
pub struct PlaneConstraint<'a> {
    window: SyncedWindow<'a>,
    config: RigConfig,
    plane: PlaneTriangulator,
    dp: f64,
}

impl<'a> PlaneConstraint<'a> {
    pub fn new(window: SyncedWindow<'a>, config: RigConfig, settings: &CalibrationSettings) -> Self {
        Self {
            window,
            config,
            plane: PlaneTriangulator::new(settings.z0),
            dp: settings.dp,
        }
    }

    pub fn window(&self) -> SyncedWindow<'a> {
        self.window
    }

    fn projector(&self, params: &CameraParams, slot: CameraSlot) -> Projector {
        Projector::new(params.orientation(slot), self.config.camera(slot))
    }

    /// Re-derives both camera pans from the shared heading `phi`.
    ///
    /// Each camera plane-projects the first and the last detection of its reference track. The
    /// pan is then rotated so the displacement between both projections heads in the direction
    /// `phi`. Rotating a pan by `delta` rotates the plane projections of that camera by `delta`
    /// around it, so this is exact and needs no iteration.
    ///
    /// A camera whose endpoints project onto the same spot has no heading and keeps its pan.
    pub fn anchor(&self, params: CameraParams) -> Result<CameraParams> {
        let [first, last] = self.window.endpoints();
        let mut anchored = params;
        for slot in CameraSlot::BOTH {
            let pick = |(a, b): (ScreenCoordinate, ScreenCoordinate)| match slot {
                CameraSlot::First => a,
                CameraSlot::Second => b,
            };
            let projector = self.projector(&params, slot);
            let start = projector.project_to_plane(pick(first), self.plane.z0())?;
            let end = projector.project_to_plane(pick(last), self.plane.z0())?;
            let displacement = (end - start).xy();
            if displacement.norm() == 0.0 {
                continue;
            }
            let heading = displacement.y.atan2(displacement.x);
            anchored = anchored.with_pan(slot, params.pan(slot) + params.phi - heading);
        }
        Ok(anchored)
    }

    /// The distance between both plane projections on each frame of the window.
    ///
    /// The parameters are used as they are, without anchoring.
    pub fn residuals(&self, params: CameraParams) -> impl Iterator<Item = Result<f64>> + 'a {
        let first = self.projector(&params, CameraSlot::First);
        let second = self.projector(&params, CameraSlot::Second);
        let plane = self.plane;
        self.window.pairs().map(move |(a, b)| {
            plane
                .triangulate(&first.ray(a), &second.ray(b))
                .map(|triangulation| triangulation.residual)
        })
    }

    /// The loss after anchoring the pans of `params`.
    pub fn loss(&self, params: CameraParams) -> Result<f64> {
        self.residuals(self.anchor(params)?).sum()
    }

    /// The symmetric finite-difference gradient of [`PlaneConstraint::loss`] with respect to
    /// `(theta1, theta2, phi)`.
    pub fn gradient(&self, params: CameraParams) -> Result<Vector3<f64>> {
        let searched = params.searched();
        let mut gradient = Vector3::zeros();
        for i in 0..CameraParams::SEARCHED {
            let mut delta = Vector3::zeros();
            delta[i] = self.dp;
            let forward = self.loss(params.with_searched(searched + delta))?;
            let backward = self.loss(params.with_searched(searched - delta))?;
            gradient[i] = (forward - backward) / (2.0 * self.dp);
        }
        Ok(gradient)
    }

    /// One descent step: anchors the pans, then moves the searched parameters a distance of
    /// `learning_rate` against the gradient.
    ///
    /// Fails with [`Error::DegenerateGradient`] when the gradient has no direction.
    pub fn descend(&self, params: CameraParams, learning_rate: f64) -> Result<CameraParams> {
        let anchored = self.anchor(params)?;
        let gradient = self.gradient(anchored)?;
        let norm = gradient.norm();
        if norm == 0.0 || !norm.is_finite() {
            return Err(Error::DegenerateGradient);
        }
        Ok(anchored.with_searched(anchored.searched() - gradient * (learning_rate / norm)))
    }
}
