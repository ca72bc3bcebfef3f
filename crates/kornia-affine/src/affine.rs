use serde::{Deserialize, Serialize};

use crate::conditioning::condition_point_pair;
use crate::correspondence::{split_correspondences, Correspondence};
use crate::error::AffineError;
use crate::linalg;

/// Relative tolerance on singular values below which a matrix is treated as rank deficient.
const RANK_RCOND: f64 = 1e-10;

/// A 2D affine transform stored as a row-major 3x3 matrix.
///
/// The matrix always has the form `[[a, b, tx], [c, d, ty], [0, 0, 1]]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[[f64; 3]; 3]", into = "[[f64; 3]; 3]")]
pub struct AffineMatrix([[f64; 3]; 3]);

impl AffineMatrix {
    /// The identity transform.
    pub fn identity() -> Self {
        Self([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
    }

    /// Build a transform `x' = A x + t` from its linear block and translation.
    pub fn from_linear_translation(linear: [[f64; 2]; 2], translation: [f64; 2]) -> Self {
        Self([
            [linear[0][0], linear[0][1], translation[0]],
            [linear[1][0], linear[1][1], translation[1]],
            [0.0, 0.0, 1.0],
        ])
    }

    /// Build a transform from a 3x3 matrix with an affine bottom row `(0, 0, w)`, `w != 0`.
    ///
    /// The matrix is scaled so that `w` becomes one.
    pub fn try_from_array(m: [[f64; 3]; 3]) -> Result<Self, AffineError> {
        if !linalg::is_finite_mat33(&m) {
            return Err(AffineError::SolveFailure(
                "matrix has non-finite entries".to_string(),
            ));
        }
        if m[2][0] != 0.0 || m[2][1] != 0.0 || m[2][2] == 0.0 {
            return Err(AffineError::SolveFailure(format!(
                "bottom row {:?} is not affine",
                m[2]
            )));
        }
        let mut m = m;
        linalg::normalize_mat33_inplace(&mut m);
        m[2] = [0.0, 0.0, 1.0];
        Ok(Self(m))
    }

    /// The transform as a row-major 3x3 matrix.
    pub fn as_array(&self) -> &[[f64; 3]; 3] {
        &self.0
    }

    /// The 2x2 linear block.
    pub fn linear(&self) -> [[f64; 2]; 2] {
        [[self.0[0][0], self.0[0][1]], [self.0[1][0], self.0[1][1]]]
    }

    /// The translation column.
    pub fn translation(&self) -> [f64; 2] {
        [self.0[0][2], self.0[1][2]]
    }

    /// Map a point through the transform.
    #[inline]
    pub fn transform_point(&self, p: &[f64; 2]) -> [f64; 2] {
        let mut out = [0.0; 3];
        linalg::mat33_mul_vec3(&self.0, &[p[0], p[1], 1.0], &mut out);
        [out[0], out[1]]
    }

    /// The inverse transform, mapping target points back to the source frame.
    ///
    /// # Errors
    ///
    /// [`AffineError::SolveFailure`] if the linear block is singular.
    pub fn inverse(&self) -> Result<Self, AffineError> {
        let inv = linalg::inverse_mat33(&self.0).ok_or_else(|| {
            AffineError::SolveFailure("affine matrix is not invertible".to_string())
        })?;
        Self::try_from_array([inv[0], inv[1], [0.0, 0.0, inv[2][2]]])
    }
}

impl Default for AffineMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl TryFrom<[[f64; 3]; 3]> for AffineMatrix {
    type Error = AffineError;

    fn try_from(m: [[f64; 3]; 3]) -> Result<Self, Self::Error> {
        Self::try_from_array(m)
    }
}

impl From<AffineMatrix> for [[f64; 3]; 3] {
    fn from(m: AffineMatrix) -> Self {
        m.0
    }
}

/// Compute the affine transform mapping `src` onto `dst` with the conditioned DLT.
///
/// Both point sets are conditioned with a shared scale, the (x, y) rows of both sets are
/// stacked into a 4xN matrix `A`, and the two dominant right singular vectors of `A^T` give
/// the linear part `R = C * pinv(B)` (Hartley-Zisserman, 2nd ed. p. 130). The translation
/// is recovered when deconditioning: `H = inv(T_dst) * [R | 0] * T_src`.
///
/// * `src` - The source 2d points with shape (N, 2), N >= 3.
/// * `dst` - The destination 2d points with shape (N, 2).
///
/// Three points give an exact fit, more points a least-squares fit.
///
/// # Errors
///
/// - [`AffineError::ShapeMismatch`] if the point sets differ in size.
/// - [`AffineError::InsufficientData`] if fewer than three points are given.
/// - [`AffineError::DegenerateInput`] if all source points coincide.
/// - [`AffineError::SolveFailure`] for rank-deficient (e.g. collinear) configurations.
pub fn affine_from_points(src: &[[f64; 2]], dst: &[[f64; 2]]) -> Result<AffineMatrix, AffineError> {
    if src.len() != dst.len() {
        return Err(AffineError::ShapeMismatch {
            left_len: src.len(),
            right_len: dst.len(),
        });
    }
    if src.len() < 3 {
        return Err(AffineError::InsufficientData {
            required: 3,
            actual: src.len(),
        });
    }

    let pair = condition_point_pair(src, dst)?;

    // A^T with shape (N, 4): one row [x, y, x', y'] per conditioned correspondence
    let n = src.len();
    let mut mat_at = faer::Mat::<f64>::zeros(n, 4);
    for (i, (p, q)) in pair.src.iter().zip(pair.dst.iter()).enumerate() {
        mat_at.write(i, 0, p[0]);
        mat_at.write(i, 1, p[1]);
        mat_at.write(i, 2, q[0]);
        mat_at.write(i, 3, q[1]);
    }

    let svd = mat_at.svd();
    let s = svd.s_diagonal();
    if !(s.read(0).is_finite() && s.read(1).is_finite()) {
        return Err(AffineError::SolveFailure(
            "svd did not converge".to_string(),
        ));
    }
    if s.read(1) <= RANK_RCOND * s.read(0) {
        return Err(AffineError::SolveFailure(
            "correspondences span less than two dimensions".to_string(),
        ));
    }

    // first two right singular vectors stacked as [B; C], each block 2x2
    let v = svd.v();
    let mat_b = v.submatrix(0, 0, 2, 2);
    let mat_c = linalg::faer_to_mat22(v.submatrix(2, 0, 2, 2));
    let b_pinv = pinv22(mat_b)?;

    let mut r = [[0.0; 2]; 2];
    for (i, row) in r.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = mat_c[i][0] * b_pinv[0][j] + mat_c[i][1] * b_pinv[1][j];
        }
    }

    // conditioned points are zero mean, so the translation vanishes in that frame
    let h_cond = [
        [r[0][0], r[0][1], 0.0],
        [r[1][0], r[1][1], 0.0],
        [0.0, 0.0, 1.0],
    ];

    // decondition: H = inv(T_dst) * H_cond * T_src
    let mut tmp = [[0.0; 3]; 3];
    linalg::matmul33(&h_cond, &pair.src_conditioning.matrix(), &mut tmp);
    let mut h = [[0.0; 3]; 3];
    linalg::matmul33(&pair.dst_conditioning.inverse_matrix(), &tmp, &mut h);

    AffineMatrix::try_from_array(h)
}

/// Fit a single affine transform to every correspondence, without outlier rejection.
///
/// # Errors
///
/// Same as [`affine_from_points`].
pub fn affine_from_correspondences(
    correspondences: &[Correspondence],
) -> Result<AffineMatrix, AffineError> {
    let (src, dst) = split_correspondences(correspondences);
    affine_from_points(&src, &dst)
}

// Moore-Penrose pseudo-inverse of a 2x2 matrix through its SVD.
fn pinv22(m: faer::MatRef<'_, f64>) -> Result<[[f64; 2]; 2], AffineError> {
    let svd = m.to_owned().svd();
    let s = svd.s_diagonal();
    let (s0, s1) = (s.read(0), s.read(1));
    if !(s0.is_finite() && s1.is_finite()) || s0 == 0.0 || s1 <= RANK_RCOND * s0 {
        return Err(AffineError::SolveFailure(
            "singular block in null-space extraction".to_string(),
        ));
    }

    // pinv = V * S^-1 * U^T
    let u = linalg::faer_to_mat22(svd.u());
    let v = linalg::faer_to_mat22(svd.v());
    let s_inv = [1.0 / s0, 1.0 / s1];

    let mut out = [[0.0; 2]; 2];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = v[i][0] * s_inv[0] * u[j][0] + v[i][1] * s_inv[1] * u[j][1];
        }
    }
    Ok(out)
}
