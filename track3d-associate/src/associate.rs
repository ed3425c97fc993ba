use crate::{AssociationSettings, PathTriangulator};
use float_ord::FloatOrd;
use log::{info, trace};
use std::fmt;
use track3d_core::{
    nalgebra::distance, sync, CalibrationSettings, CameraSystem, Error, MatchResult, Result,
    Track,
};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Why a track pair can not be a match.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// One of the tracks is less confident than the threshold.
    LowConfidence,
    /// The pair could not be triangulated, typically because the tracks share no frames or
    /// because the rays are parallel.
    Unreconstructable(Error),
    /// The mean residual is above the maximum loss.
    Loss(f64),
    /// The path does not move far enough between its endpoints.
    Static(f64),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::LowConfidence => write!(f, "confidence too low"),
            Rejection::Unreconstructable(e) => write!(f, "{}", e),
            Rejection::Loss(loss) => write!(f, "loss {:.4} too high", loss),
            Rejection::Static(displacement) => {
                write!(f, "displacement {:.4} too short", displacement)
            }
        }
    }
}

/// The evaluation of one track pair.
#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    Accepted { loss: f64, displacement: f64 },
    Rejected(Rejection),
}

impl Candidate {
    /// The loss of the pair, which is infinite when it was rejected.
    pub fn loss(&self) -> f64 {
        match *self {
            Candidate::Accepted { loss, .. } => loss,
            Candidate::Rejected(_) => f64::INFINITY,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Candidate::Accepted { .. })
    }
}

/// The evaluation of every pair of a track of the first camera with a track of the second
/// camera, stored row major.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateMatrix {
    rows: usize,
    cols: usize,
    cells: Vec<Candidate>,
}

impl CandidateMatrix {
    /// Number of tracks of the first camera.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of tracks of the second camera.
    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, i: usize, j: usize) -> Option<&Candidate> {
        if i < self.rows && j < self.cols {
            self.cells.get(i * self.cols + j)
        } else {
            None
        }
    }

    /// The loss of pair `(i, j)`, infinite when it was rejected or is out of bounds.
    pub fn loss(&self, i: usize, j: usize) -> f64 {
        self.get(i, j).map_or(f64::INFINITY, Candidate::loss)
    }

    /// Iterates over the accepted pairs as `(i, j, loss)`.
    pub fn accepted(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, candidate)| candidate.is_accepted())
            .map(move |(ix, candidate)| (ix / self.cols, ix % self.cols, candidate.loss()))
    }

    /// Pairs tracks greedily: the accepted pair with the lowest loss is committed first, which
    /// takes its row and its column out of consideration, and so on until no pair is left.
    ///
    /// Ties are broken by the lowest `i` then the lowest `j`. The assignment is returned
    /// ordered by ascending loss as `(i, j, loss)`. It is not guaranteed to be globally optimal.
    pub fn assign(&self) -> Vec<(usize, usize, f64)> {
        let mut pairs: Vec<_> = self.accepted().collect();
        pairs.sort_unstable_by_key(|&(i, j, loss)| (FloatOrd(loss), i, j));
        let mut used_rows = vec![false; self.rows];
        let mut used_cols = vec![false; self.cols];
        pairs
            .into_iter()
            .filter(|&(i, j, _)| {
                if used_rows[i] || used_cols[j] {
                    false
                } else {
                    used_rows[i] = true;
                    used_cols[j] = true;
                    true
                }
            })
            .collect()
    }
}

/// Finds which track of the first camera is the same subject as which track of the second
/// camera, and reconstructs their 3d paths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Associator {
    triangulator: PathTriangulator,
    settings: AssociationSettings,
}

impl Associator {
    /// Creates an associator for a calibrated system.
    ///
    /// Frames seen by a single camera are projected onto [`AssociationSettings::plane_height`],
    /// or onto the reference plane of `calibration` when that is not set.
    pub fn new(
        system: &CameraSystem,
        calibration: &CalibrationSettings,
        settings: AssociationSettings,
    ) -> Self {
        let z0 = settings.plane_height.unwrap_or(calibration.z0);
        Self {
            triangulator: PathTriangulator::new(system, z0),
            settings,
        }
    }

    pub fn triangulator(&self) -> &PathTriangulator {
        &self.triangulator
    }

    pub fn settings(&self) -> &AssociationSettings {
        &self.settings
    }

    /// Evaluates a single pair.
    ///
    /// Any triangulation failure along the union path rejects the pair as
    /// [`Rejection::Unreconstructable`].
    pub fn evaluate(&self, first: &Track, second: &Track) -> Candidate {
        match self.score(first, second) {
            Ok(candidate) => candidate,
            Err(e) => Candidate::Rejected(Rejection::Unreconstructable(e)),
        }
    }

    fn score(&self, first: &Track, second: &Track) -> Result<Candidate> {
        let min_confidence = self.settings.min_confidence;
        if first.confidence() < min_confidence || second.confidence() < min_confidence {
            return Ok(Candidate::Rejected(Rejection::LowConfidence));
        }
        let loss = self.triangulator.loss(&sync(first, second)?)?;
        if !(loss <= self.settings.max_loss) {
            return Ok(Candidate::Rejected(Rejection::Loss(loss)));
        }
        // Every frame of the path must triangulate, not only its endpoints.
        let (_, path) = self.triangulator.path(first, second)?;
        let displacement = match (path.first(), path.last()) {
            (Some(start), Some(end)) => distance(start, end),
            _ => 0.0,
        };
        if displacement < self.settings.min_dist {
            return Ok(Candidate::Rejected(Rejection::Static(displacement)));
        }
        Ok(Candidate::Accepted { loss, displacement })
    }

    /// Evaluates every pair of a track of the first camera with a track of the second camera.
    ///
    /// Every cell only depends on its two tracks. With the `rayon` feature the cells are
    /// evaluated in parallel, which produces the same matrix.
    pub fn candidates(&self, first: &[Track], second: &[Track]) -> CandidateMatrix {
        let cols = second.len();
        let evaluate = |ix: usize| {
            let (i, j) = (ix / cols, ix % cols);
            let candidate = self.evaluate(&first[i], &second[j]);
            if let Candidate::Rejected(rejection) = &candidate {
                trace!("rejected pair ({}, {}): {}", i, j, rejection);
            }
            candidate
        };
        let len = first.len() * cols;
        #[cfg(not(feature = "rayon"))]
        let cells = (0..len).map(evaluate).collect();
        #[cfg(feature = "rayon")]
        let cells = (0..len).into_par_iter().map(evaluate).collect();
        CandidateMatrix {
            rows: first.len(),
            cols,
            cells,
        }
    }

    /// Pairs the tracks of both cameras and reconstructs the path of every pair.
    ///
    /// No track is used by more than one pair. The matches are ordered by ascending loss.
    ///
    /// ```
    /// use track3d_associate::{AssociationSettings, Associator};
    /// use track3d_core::{CalibrationSettings, CameraConfig, CameraSystem, RigConfig};
    /// use track3d_core::nalgebra::Point3;
    ///
    /// let camera = CameraConfig::new(1.0, 1.5, Point3::new(0.0, 0.0, 6.0));
    /// let system = CameraSystem::new(RigConfig::new(camera, camera));
    /// let associator = Associator::new(&system, &CalibrationSettings::default(), AssociationSettings::default());
    /// assert!(associator.associate(&[], &[]).unwrap().is_empty());
    /// ```
    pub fn associate(&self, first: &[Track], second: &[Track]) -> Result<Vec<MatchResult>> {
        let candidates = self.candidates(first, second);
        let assignment = candidates.assign();
        info!(
            "paired {} of {} x {} tracks",
            assignment.len(),
            first.len(),
            second.len()
        );
        let mut matches = assignment
            .into_iter()
            .map(|(i, j, _)| self.triangulator.triangulate(i, &first[i], j, &second[j]))
            .collect::<Result<Vec<_>>>()?;
        matches.sort_by_key(|result| FloatOrd(result.loss));
        Ok(matches)
    }
}
