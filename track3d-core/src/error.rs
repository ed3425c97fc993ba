use crate::FrameSpan;
use thiserror::Error;

/// Everything that can go wrong while calibrating, associating or reconstructing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Two tracks share no frames.
    #[error("tracks do not overlap: {first} and {second}")]
    NoOverlap { first: FrameSpan, second: FrameSpan },
    /// The 2x2 closest approach system could not be inverted because the rays are
    /// (nearly) parallel.
    #[error("closest approach system is singular (relative determinant {determinant:e})")]
    SingularSystem { determinant: f64 },
    /// The finite-difference gradient of the calibration loss vanished.
    #[error("finite-difference gradient has zero norm")]
    DegenerateGradient,
    /// A ray has no vertical component, so it never reaches the reference plane.
    #[error("ray never reaches the plane z = {z0}")]
    ParallelToPlane { z0: f64 },
    /// A world point cannot be seen by a camera because it lies behind it.
    #[error("point lies behind the camera")]
    BehindCamera,
    /// The validity span of a track does not fit inside its samples.
    #[error("track span {span} is invalid for {len} samples")]
    InvalidTrack { span: FrameSpan, len: usize },
    /// A persisted record has the wrong shape or contains unusable numbers.
    #[error("malformed record: {0}")]
    MalformedRecord(String),
    /// Calibration was aborted, identifying the iteration where it happened.
    #[error("calibration aborted on iteration {iteration}: {source}")]
    Calibration {
        iteration: usize,
        #[source]
        source: Box<Error>,
    },
    /// A track pair could not be reconstructed, identifying the offending pair.
    #[error("pair ({i}, {j}): {source}")]
    Pair {
        i: usize,
        j: usize,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Attaches the calibration iteration to an error.
    pub fn at_iteration(self, iteration: usize) -> Self {
        Error::Calibration {
            iteration,
            source: Box::new(self),
        }
    }

    /// Attaches the indices of a track pair to an error.
    pub fn for_pair(self, i: usize, j: usize) -> Self {
        Error::Pair {
            i,
            j,
            source: Box::new(self),
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
