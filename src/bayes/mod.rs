use nalgebra::*;
use rand::RngCore;
use rayon::prelude::*;
use serde::{Serialize, Deserialize};
use crate::sample::*;
use crate::prob::*;
use crate::basis::*;
use crate::calc::running::Moments;
use crate::codec::{self, DecodeError};
use crate::model::{self, Classifier, ClassifierError};

/// Dimension of the reduced feature space.
pub const FEATURES : usize = 50;

/// Number of subspace power iterations used to approximate the basis.
pub const EIG_ITERATIONS : usize = 300;

/// Number of training images drawn to estimate the covariance matrix.
pub const COV_SAMPLES : usize = 5000;

/// Training hyperparameters. Missing fields of a JSON configuration take their default value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BayesConfig {

    pub features : usize,

    pub eig_iterations : usize,

    pub cov_samples : usize,

    pub variance_floor : f64

}

impl Default for BayesConfig {

    fn default() -> Self {
        Self {
            features : FEATURES,
            eig_iterations : EIG_ITERATIONS,
            cov_samples : COV_SAMPLES,
            variance_floor : VARIANCE_FLOOR
        }
    }

}

impl BayesConfig {

    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.features == 0 || self.features > PIXELS {
            return Err(ClassifierError::InvalidConfig(format!("features must be in [1, {}]", PIXELS)));
        }
        if self.cov_samples == 0 {
            return Err(ClassifierError::InvalidConfig("cov_samples must be positive".into()));
        }
        if !(self.variance_floor > 0.0 && self.variance_floor.is_finite()) {
            return Err(ClassifierError::InvalidConfig("variance_floor must be positive".into()));
        }
        Ok(())
    }

}

/// Gaussian generative classifier over a PCA-reduced feature space.
///
/// Training draws an estimate of the pixel covariance matrix (all labels pooled),
/// extracts its approximate top eigenvectors as a (features x PIXELS) basis, then projects
/// every training image through the basis to fit one diagonal Gaussian per label, plus a
/// pooled Gaussian over all images. A sample is classified by the label whose Gaussian has
/// the largest log-likelihood ratio against the pooled Gaussian.
///
/// An untrained classifier has an empty basis: every label then scores zero
/// and classification falls back to label 0.
#[derive(Debug, Clone)]
pub struct Bayes {

    config : BayesConfig,

    basis : DMatrix<f64>,

    classes : Vec<Vec<Gaussian>>,

    pooled : Vec<Gaussian>

}

impl Default for Bayes {

    fn default() -> Self {
        Self::new(BayesConfig::default())
    }

}

/// Persisted form of the learned state. The basis is stored row-major.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BayesArchive {
    features : usize,
    pixels : usize,
    basis : Vec<f64>,
    classes : Vec<Vec<Gaussian>>,
    pooled : Vec<Gaussian>
}

impl Bayes {

    pub const NAME : &'static str = "bayes";

    pub fn new(config : BayesConfig) -> Self {
        Self {
            config,
            basis : DMatrix::zeros(0, PIXELS),
            classes : vec![Vec::new(); LABELS],
            pooled : Vec::new()
        }
    }

    /// Assembles a classifier from already-learned state, checking that the basis has
    /// PIXELS columns, that there is one Gaussian per basis row for each label and for the
    /// pooled set, and that every value is finite with strictly positive variances.
    pub fn from_parts(
        basis : DMatrix<f64>,
        classes : Vec<Vec<Gaussian>>,
        pooled : Vec<Gaussian>
    ) -> Result<Self, DecodeError> {
        let features = basis.nrows();
        if basis.ncols() != PIXELS {
            return Err(DecodeError::Shape(format!("basis has {} columns, expected {}", basis.ncols(), PIXELS)));
        }
        if basis.iter().any(|b| !b.is_finite() ) {
            return Err(DecodeError::Value("non-finite basis entry".into()));
        }
        if classes.len() != LABELS {
            return Err(DecodeError::Shape(format!("{} class distributions, expected {}", classes.len(), LABELS)));
        }
        for (label, gaussians) in classes.iter().enumerate() {
            check_gaussians(gaussians, features, Some(label))?;
        }
        check_gaussians(&pooled, features, None)?;
        let config = BayesConfig { features, ..BayesConfig::default() };
        Ok(Self { config, basis, classes, pooled })
    }

    pub fn config(&self) -> &BayesConfig {
        &self.config
    }

    pub fn basis(&self) -> &DMatrix<f64> {
        &self.basis
    }

    pub fn classes(&self) -> &[Vec<Gaussian>] {
        &self.classes[..]
    }

    pub fn pooled(&self) -> &[Gaussian] {
        &self.pooled[..]
    }

    /// Projects the image into the reduced feature space.
    pub fn project(&self, s : &Sample) -> DVector<f64> {
        &self.basis * s.vector()
    }

    /// Log-likelihood ratio of each label's Gaussian against the pooled Gaussian,
    /// summed over the independent feature dimensions.
    pub fn scores(&self, s : &Sample) -> [f64; LABELS] {
        let features = self.project(s);
        let mut scores = [0.0; LABELS];
        for (score, gaussians) in scores.iter_mut().zip(self.classes.iter()) {
            *score = gaussians.iter()
                .zip(self.pooled.iter())
                .zip(features.iter())
                .fold(0.0, |sum, ((g, p), f)| sum + g.log_ratio(p, *f) );
        }
        scores
    }

    pub fn deserialize(d : &[u8]) -> Result<Self, ClassifierError> {
        let archive : BayesArchive = codec::decode(d)?;
        if archive.pixels != PIXELS {
            return Err(DecodeError::Shape(format!("archive images have {} pixels, expected {}", archive.pixels, PIXELS)).into());
        }
        if archive.basis.len() != archive.features * archive.pixels {
            return Err(DecodeError::Shape(format!(
                "basis has {} entries, expected {}x{}",
                archive.basis.len(),
                archive.features,
                archive.pixels
            )).into());
        }
        let basis = DMatrix::from_row_slice(archive.features, archive.pixels, &archive.basis[..]);
        Ok(Self::from_parts(basis, archive.classes, archive.pooled)?)
    }

}

fn check_gaussians(gaussians : &[Gaussian], features : usize, label : Option<usize>) -> Result<(), DecodeError> {
    if gaussians.len() != features {
        return Err(DecodeError::Shape(format!(
            "{} gaussians for label {:?}, expected {}",
            gaussians.len(),
            label,
            features
        )));
    }
    for (feature, g) in gaussians.iter().enumerate() {
        if !(g.variance > 0.0 && g.variance.is_finite()) {
            return Err(DecodeError::Variance { label, feature, value : g.variance });
        }
        if !g.mean.is_finite() {
            return Err(DecodeError::Value(format!("non-finite mean for label {:?}, feature {}", label, feature)));
        }
    }
    Ok(())
}

/// Fits one Gaussian per basis row to the projections of the training images accepted
/// by the predicate. Returns None when the predicate accepts no image.
pub fn estimate_gaussians<F>(
    basis : &DMatrix<f64>,
    data : &[TrainingSample],
    floor : f64,
    pred : F
) -> Option<Vec<Gaussian>>
where
    F : Fn(&TrainingSample) -> bool
{
    let mut moments = Moments::new(basis.nrows());
    for s in data.iter().filter(|s| pred(*s) ) {
        moments.push(&(basis * s.sample.vector()));
    }
    let gaussians = moments.finish()?
        .into_iter()
        .map(|(mean, var)| Gaussian::from_moments(mean, var, floor) )
        .collect();
    Some(gaussians)
}

impl Classifier for Bayes {

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn train(
        &mut self,
        data : &[TrainingSample],
        validation : &[TrainingSample],
        rng : &mut dyn RngCore
    ) -> Result<(), ClassifierError> {
        self.config.validate()?;
        let counts = label_counts(data);
        if let Some(label) = counts.iter().position(|c| *c == 0 ) {
            return Err(ClassifierError::EmptyClass(label));
        }
        let BayesConfig { features, eig_iterations, cov_samples, variance_floor } = self.config;

        log::info!("Training classifier...");
        log::info!("Estimating covariance from {} draws", cov_samples);
        let cov = sample_covariance(data, cov_samples, rng)
            .ok_or_else(|| ClassifierError::InvalidConfig("empty covariance estimate".into()) )?;

        log::info!("Computing {} basis vectors ({} iterations)", features, eig_iterations);
        let eig = largest_eigenvectors(&cov, features, eig_iterations, rng);
        let basis = eig.basis;

        log::info!("Estimating class gaussians");
        let classes = (0..LABELS).into_par_iter()
            .map(|label| {
                log::debug!("Label {}", label);
                estimate_gaussians(&basis, data, variance_floor, |s| s.label == label )
                    .ok_or(ClassifierError::EmptyClass(label))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let pooled = estimate_gaussians(&basis, data, variance_floor, |_| true )
            .ok_or(ClassifierError::EmptyClass(0))?;

        self.basis = basis;
        self.classes = classes;
        self.pooled = pooled;
        model::report_validation(&*self, validation);
        Ok(())
    }

    /// Ties are resolved in favour of the lowest label.
    fn classify(&self, s : &Sample) -> usize {
        let mut best_score = f64::NEG_INFINITY;
        let mut best_label = 0;
        for (label, score) in self.scores(s).iter().enumerate() {
            if *score > best_score {
                best_score = *score;
                best_label = label;
            }
        }
        best_label
    }

    fn serialize(&self) -> Result<Vec<u8>, ClassifierError> {
        let archive = BayesArchive {
            features : self.basis.nrows(),
            pixels : self.basis.ncols(),
            basis : self.basis.transpose().as_slice().to_vec(),
            classes : self.classes.clone(),
            pooled : self.pooled.clone()
        };
        codec::encode(&archive).map_err(ClassifierError::Encode)
    }

}
