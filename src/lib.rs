/// Digit images (fixed 28x28 intensity vectors) and their labelled counterparts.
pub mod sample;

/// Loading of labelled digit tables from CSV files.
pub mod table;

/// Streaming accumulators for first and second moments.
pub mod calc;

/// Univariate (diagonal) Gaussians used by the generative classifiers.
pub mod prob;

/// Dimensionality-reducing bases obtained by subspace power iteration over a covariance matrix.
pub mod basis;

/// PCA-reduced Gaussian generative classifier, which ranks labels by the log-likelihood
/// ratio of class-conditional Gaussians against a pooled reference Gaussian.
pub mod bayes;

/// K-nearest-neighbour classifier over cosine distances to stored templates.
pub mod neighbors;

/// Persisted archive format: JSON documents behind a reversible zstd transform.
pub mod codec;

/// The classifier contract shared by every implementation, and the registry
/// that maps names to constructors and deserializers.
pub mod model;

pub use sample::{Sample, TrainingSample, PIXELS, LABELS};

pub use model::{Classifier, ClassifierError};
