/// Principal components basis reduction by subspace (orthogonal) power iteration.
/// The basis is useful for reducing images with many correlated pixels to a
/// handful of directions of largest variance.
pub mod pca;

pub use pca::*;
