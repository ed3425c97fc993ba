use crate::FrameSpan;
use nalgebra::Point3;

/// A track from the first camera paired with a track from the second camera, together with
/// the 3d path reconstructed from both.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// Index of the track among the first camera's tracks.
    pub i: usize,
    /// Index of the track among the second camera's tracks.
    pub j: usize,
    /// Mean triangulation residual over the frames seen by both cameras.
    pub loss: f64,
    /// The frames seen by at least one of the two cameras.
    pub span: FrameSpan,
    /// One point per frame of `span`, in frame order.
    pub points: Vec<Point3<f64>>,
}

impl MatchResult {
    /// Number of reconstructed points.
    pub fn size(&self) -> usize {
        self.points.len()
    }

    /// The point reconstructed for an absolute frame, if it is in the span.
    pub fn point(&self, frame: usize) -> Option<Point3<f64>> {
        if self.span.contains(frame) {
            self.points.get(frame - self.span.start).copied()
        } else {
            None
        }
    }

    /// The straight-line distance between the first and the last point of the path.
    pub fn displacement(&self) -> f64 {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (last - first).norm(),
            _ => 0.0,
        }
    }
}
