use nalgebra::DMatrix;

/// Defines √2
pub(crate) const SQRT_2: f64 = std::f64::consts::SQRT_2;

/// Defines √(3/2)
pub(crate) const SQRT_3_BY_2: f64 = 1.224744871391589;

/// Returns the number of Mandel components for a space dimension
///
/// ```text
/// 2D (plane-strain): [xx, yy, zz, √2 xy]
/// 3D:                [xx, yy, zz, √2 xy, √2 yz, √2 zx]
/// ```
#[inline]
pub fn mandel_dim(ndim: usize) -> usize {
    if ndim == 2 {
        4
    } else {
        6
    }
}

/// Returns the second-order identity tensor component (Mandel)
#[inline]
pub(crate) fn identity(i: usize) -> f64 {
    if i < 3 {
        1.0
    } else {
        0.0
    }
}

/// Returns the trace of a second-order tensor given in Mandel basis
#[inline]
pub fn trace(a: &[f64]) -> f64 {
    a[0] + a[1] + a[2]
}

/// Returns the mean stress σm = tr(σ) / 3
#[inline]
pub fn invariant_sigma_m(sigma: &[f64]) -> f64 {
    trace(sigma) / 3.0
}

/// Computes the deviator s = dev(a)
pub fn deviator(s: &mut [f64], a: &[f64]) {
    let m = trace(a) / 3.0;
    for i in 0..a.len() {
        s[i] = a[i] - m * identity(i);
    }
}

/// Returns the Euclidean norm of a tensor given in Mandel basis
#[inline]
pub fn norm(a: &[f64]) -> f64 {
    a.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Returns the von Mises equivalent stress σd = √(3/2) ‖dev(σ)‖
pub fn invariant_sigma_d(sigma: &[f64]) -> f64 {
    let mut s = vec![0.0; sigma.len()];
    deviator(&mut s, sigma);
    SQRT_3_BY_2 * norm(&s)
}

/// Returns the symmetric-deviator projector component Psd[i][j] (Mandel)
#[inline]
pub(crate) fn p_symdev(i: usize, j: usize) -> f64 {
    let delta = if i == j { 1.0 } else { 0.0 };
    delta - identity(i) * identity(j) / 3.0
}

/// Computes the isotropic linear elastic modulus D = 2G Psd + K I⊗I (Mandel)
pub fn elastic_modulus(ndim: usize, young: f64, poisson: f64) -> DMatrix<f64> {
    let (kk, gg) = bulk_shear(young, poisson);
    let nd = mandel_dim(ndim);
    DMatrix::from_fn(nd, nd, |i, j| 2.0 * gg * p_symdev(i, j) + kk * identity(i) * identity(j))
}

/// Returns the bulk and shear moduli (K, G)
#[inline]
pub fn bulk_shear(young: f64, poisson: f64) -> (f64, f64) {
    let kk = young / (3.0 * (1.0 - 2.0 * poisson));
    let gg = young / (2.0 * (1.0 + poisson));
    (kk, gg)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
