use nalgebra::*;

/* Both accumulators below follow the single-pass (sum, sum of squares) scheme:
the first moment and the raw second moment are summed as observations arrive,
and central moments are only recovered when the pass is finished as
E[x^2] - E[x]^2. */

pub mod running {

    use super::*;

    /// Accumulates column sums and cross-products of a stream of vectors, yielding their
    /// (population) covariance matrix.
    #[derive(Debug, Clone)]
    pub struct Covariance {
        n : usize,
        sum : DVector<f64>,
        cross : DMatrix<f64>
    }

    impl Covariance {

        pub fn new(dim : usize) -> Self {
            Self { n : 0, sum : DVector::zeros(dim), cross : DMatrix::zeros(dim, dim) }
        }

        pub fn dim(&self) -> usize {
            self.sum.nrows()
        }

        pub fn count(&self) -> usize {
            self.n
        }

        pub fn push(&mut self, x : &DVector<f64>) {
            assert!(x.nrows() == self.dim());
            self.n += 1;
            self.sum += x;
            self.cross.ger(1.0, x, x, 1.0);
        }

        /// Returns None if no vectors were pushed.
        pub fn finish(self) -> Option<DMatrix<f64>> {
            if self.n == 0 {
                return None;
            }
            let n = self.n as f64;
            let mean = self.sum / n;
            let mut cov = self.cross / n;
            cov.ger(-1.0, &mean, &mean, 1.0);
            Some(cov)
        }

    }

    /// Per-dimension mean and (population) variance of a stream of vectors, assuming
    /// the dimensions are independent so only the diagonal is kept.
    #[derive(Debug, Clone)]
    pub struct Moments {
        n : usize,
        sum : DVector<f64>,
        sum_sq : DVector<f64>
    }

    impl Moments {

        pub fn new(dim : usize) -> Self {
            Self { n : 0, sum : DVector::zeros(dim), sum_sq : DVector::zeros(dim) }
        }

        pub fn count(&self) -> usize {
            self.n
        }

        pub fn push(&mut self, x : &DVector<f64>) {
            assert!(x.nrows() == self.sum.nrows());
            self.n += 1;
            self.sum += x;
            self.sum_sq += x.component_mul(x);
        }

        /// Returns (mean, variance) pairs per dimension, or None if no vectors were pushed.
        pub fn finish(&self) -> Option<Vec<(f64, f64)>> {
            if self.n == 0 {
                return None;
            }
            let n = self.n as f64;
            Some(self.sum.iter().zip(self.sum_sq.iter()).map(|(s, ss)| {
                let mean = s / n;
                (mean, ss / n - mean.powf(2.))
            }).collect())
        }

    }

}

#[cfg(test)]
mod tests {

    use super::running::*;
    use nalgebra::*;

    const EPS : f64 = 1E-10;

    #[test]
    fn covariance_of_known_points() {
        let data = [[1., 2.], [1.2, 3.0], [4.0, 2.1]];
        let mut acc = Covariance::new(2);
        for d in data.iter() {
            acc.push(&DVector::from_column_slice(&d[..]));
        }
        assert_eq!(acc.count(), 3);
        let cov = acc.finish().unwrap();
        let mx = (1. + 1.2 + 4.0) / 3.;
        let my = (2. + 3.0 + 2.1) / 3.;
        let vx = data.iter().map(|d| (d[0] - mx).powf(2.) ).sum::<f64>() / 3.;
        let cxy = data.iter().map(|d| (d[0] - mx) * (d[1] - my) ).sum::<f64>() / 3.;
        assert!((cov[(0, 0)] - vx).abs() < EPS);
        assert!((cov[(0, 1)] - cxy).abs() < EPS);
        assert!((cov[(1, 0)] - cov[(0, 1)]).abs() < EPS);
    }

    #[test]
    fn empty_streams_have_no_moments() {
        assert!(Covariance::new(3).finish().is_none());
        assert!(Moments::new(3).finish().is_none());
    }

    #[test]
    fn moments_are_per_dimension() {
        let mut acc = Moments::new(2);
        acc.push(&DVector::from_column_slice(&[1.0, 5.0]));
        acc.push(&DVector::from_column_slice(&[3.0, 5.0]));
        let m = acc.finish().unwrap();
        assert!((m[0].0 - 2.0).abs() < EPS);
        assert!((m[0].1 - 1.0).abs() < EPS);
        assert!((m[1].0 - 5.0).abs() < EPS);
        assert!(m[1].1.abs() < EPS);
    }

}
