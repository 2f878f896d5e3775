use nalgebra::*;
use rand::Rng;
use rand_distr::StandardNormal;
use crate::calc::running::Covariance;
use crate::sample::*;

/// Approximate top eigenvectors of a covariance matrix, laid out as rows so that
/// a (features x dim) times (dim x 1) product projects a vector into feature space.
#[derive(Debug, Clone)]
pub struct Eigenbasis {

    pub basis : DMatrix<f64>,

    /// Norms of the covariance matrix applied to each basis vector. Only
    /// meaningful as eigenvalue estimates once the iteration converged.
    pub eigenvalues : DVector<f64>

}

/// Estimates the covariance of the training distribution (all labels pooled) from
/// draws of training images, uniformly at random with replacement. Returns None
/// for an empty set or an empty draw budget.
pub fn sample_covariance<R>(data : &[TrainingSample], draws : usize, rng : &mut R) -> Option<DMatrix<f64>>
where
    R : Rng + ?Sized
{
    if data.is_empty() {
        return None;
    }
    let mut acc = Covariance::new(PIXELS);
    for _ in 0..draws {
        let ix = rng.gen_range(0, data.len());
        acc.push(data[ix].sample.vector());
    }
    acc.finish()
}

/// Runs subspace power iteration over the symmetric matrix mat: a (dim x k) matrix of
/// standard normal entries is repeatedly multiplied by mat and replaced by the
/// orthonormal factor of its QR decomposition. Re-orthonormalizing at every step
/// keeps the columns from all collapsing onto the dominant eigenvector.
///
/// The k columns are kept in the order the iteration produced them; they are not
/// sorted by eigenvalue, so if the iteration has not converged they might not be the
/// k directions of largest variance.
pub fn largest_eigenvectors<R>(mat : &DMatrix<f64>, k : usize, iterations : usize, rng : &mut R) -> Eigenbasis
where
    R : Rng + ?Sized
{
    assert!(mat.nrows() == mat.ncols());
    assert!(k <= mat.nrows());
    let dim = mat.nrows();
    let mut vecs = DMatrix::<f64>::from_fn(dim, k, |_, _| rng.sample(StandardNormal) );
    for i in 0..iterations {
        let product = mat * &vecs;
        vecs = product.qr().q();
        if (i + 1) % 50 == 0 {
            log::debug!("Power iteration {}/{}", i + 1, iterations);
        }
    }
    let projected = mat * &vecs;
    let eigenvalues = DVector::from_iterator(k, projected.column_iter().map(|c| c.norm() ));
    log::debug!("Eigenvalue estimates: {:?}", eigenvalues.as_slice());
    Eigenbasis { basis : vecs.transpose(), eigenvalues }
}
