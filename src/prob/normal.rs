use serde::{Serialize, Deserialize};

/// Variance substituted for empirical estimates that collapse to zero, which keeps
/// the log-variance and the standardized squared deviations finite.
pub const VARIANCE_FLOOR : f64 = 0.01;

/// Marginal distribution of a single feature dimension. Features are modelled
/// as independent, so a vector of these describes a diagonal-covariance Gaussian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gaussian {

    pub mean : f64,

    pub variance : f64

}

impl Gaussian {

    /// Builds the Gaussian from estimated moments, substituting floor for a
    /// variance that is not strictly positive (a constant feature, or the
    /// rounding of E[x^2] - E[x]^2 around zero).
    pub fn from_moments(mean : f64, variance : f64, floor : f64) -> Self {
        let variance = if variance > 0.0 { variance } else { floor };
        Self { mean, variance }
    }

    /// Squared deviation from the mean in variance units.
    pub fn standardized_sq(&self, x : f64) -> f64 {
        (x - self.mean).powf(2.) / self.variance
    }

    /// Twice the negative log-density at x, up to the constant ln(2 pi).
    pub fn deviance(&self, x : f64) -> f64 {
        self.variance.ln() + self.standardized_sq(x)
    }

    /// Contribution of x to the log-likelihood ratio of this Gaussian against the
    /// reference: ln(var_ref) - ln(var) + (x - mean_ref)^2 / var_ref - (x - mean)^2 / var.
    pub fn log_ratio(&self, reference : &Gaussian, x : f64) -> f64 {
        reference.deviance(x) - self.deviance(x)
    }

}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn floor_replaces_degenerate_variance() {
        assert_eq!(Gaussian::from_moments(1.0, 0.0, VARIANCE_FLOOR).variance, VARIANCE_FLOOR);
        assert_eq!(Gaussian::from_moments(1.0, -1E-17, VARIANCE_FLOOR).variance, VARIANCE_FLOOR);
        assert_eq!(Gaussian::from_moments(1.0, 2.0, VARIANCE_FLOOR).variance, 2.0);
    }

    #[test]
    fn ratio_against_itself_is_zero() {
        let g = Gaussian { mean : 0.3, variance : 0.7 };
        assert_eq!(g.log_ratio(&g, 12.0), 0.0);
    }

    #[test]
    fn ratio_favours_closer_mean() {
        let reference = Gaussian { mean : 0.0, variance : 4.0 };
        let near = Gaussian { mean : 1.0, variance : 1.0 };
        let far = Gaussian { mean : -3.0, variance : 1.0 };
        assert!(near.log_ratio(&reference, 1.0) > far.log_ratio(&reference, 1.0));
        let expected = 4f64.ln() - 1f64.ln() + 1.0 / 4.0 - 0.0;
        assert!((near.log_ratio(&reference, 1.0) - expected).abs() < 1E-12);
    }

}
