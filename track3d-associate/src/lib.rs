//! Association of the tracks of two calibrated cameras.
//!
//! Every track of the first camera is tried against every track of the second camera. A pair
//! is scored by the mean distance between the rays of both cameras over the frames both saw,
//! and rejected when it is too high or when the reconstructed path barely moves. The remaining
//! pairs are assigned greedily by ascending loss, so each track ends up in at most one match,
//! and the full 3d path of every match is reconstructed.
//!
//! Enable the `rayon` feature to score the pairs in parallel.

mod associate;
mod settings;
mod triangulate;

pub use associate::*;
pub use settings::*;
pub use triangulate::*;
