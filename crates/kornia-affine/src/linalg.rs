/// Compute the dot product of two 3-vectors.
#[inline]
pub fn dot_product3(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Multiply two row-major 3x3 matrices.
///
/// * `a` - The left matrix with shape (3, 3).
/// * `b` - The right matrix with shape (3, 3).
/// * `m` - The output matrix `a * b` with shape (3, 3).
pub fn matmul33(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3], m: &mut [[f64; 3]; 3]) {
    for (i, row) in m.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
        }
    }
}

/// Multiply a row-major 3x3 matrix by a 3-vector.
///
/// * `m` - The matrix with shape (3, 3).
/// * `v` - The vector with shape (3,).
/// * `out` - The output vector `m * v` with shape (3,).
pub fn mat33_mul_vec3(m: &[[f64; 3]; 3], v: &[f64; 3], out: &mut [f64; 3]) {
    out[0] = dot_product3(&m[0], v);
    out[1] = dot_product3(&m[1], v);
    out[2] = dot_product3(&m[2], v);
}

/// Compute the determinant of a 3x3 matrix.
pub fn det_mat33(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// Invert a 3x3 matrix using the adjugate.
///
/// Returns `None` if the determinant is zero or not finite.
pub fn inverse_mat33(m: &[[f64; 3]; 3]) -> Option<[[f64; 3]; 3]> {
    let det = det_mat33(m);
    if det == 0.0 || !det.is_finite() {
        return None;
    }
    let inv_det = 1.0 / det;

    let mut inv = [[0.0; 3]; 3];
    inv[0][0] = (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det;
    inv[0][1] = (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det;
    inv[0][2] = (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det;
    inv[1][0] = (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det;
    inv[1][1] = (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det;
    inv[1][2] = (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv_det;
    inv[2][0] = (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det;
    inv[2][1] = (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv_det;
    inv[2][2] = (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det;

    Some(inv)
}

/// Scale a 3x3 matrix in place so that its bottom-right entry is one.
///
/// The matrix is left untouched if that entry is zero.
pub fn normalize_mat33_inplace(m: &mut [[f64; 3]; 3]) {
    let w = m[2][2];
    if w == 0.0 {
        return;
    }
    for row in m.iter_mut() {
        for val in row.iter_mut() {
            *val /= w;
        }
    }
}

/// Copy a dynamically sized faer matrix into a row-major 2x2 array.
pub(crate) fn faer_to_mat22(m: faer::MatRef<'_, f64>) -> [[f64; 2]; 2] {
    [[m.read(0, 0), m.read(0, 1)], [m.read(1, 0), m.read(1, 1)]]
}

/// Check that every entry of a matrix is finite.
pub(crate) fn is_finite_mat33(m: &[[f64; 3]; 3]) -> bool {
    m.iter().flatten().all(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_matmul33_identity() {
        let a = [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        let eye = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let mut m = [[0.0; 3]; 3];
        matmul33(&a, &eye, &mut m);
        assert_eq!(m, a);
        matmul33(&eye, &a, &mut m);
        assert_eq!(m, a);
    }

    #[test]
    fn test_mat33_mul_vec3() {
        let m = [[1.0, 0.0, 5.0], [0.0, 2.0, -1.0], [0.0, 0.0, 1.0]];
        let mut out = [0.0; 3];
        mat33_mul_vec3(&m, &[1.0, 2.0, 1.0], &mut out);
        assert_eq!(out, [6.0, 3.0, 1.0]);
    }

    #[test]
    fn test_inverse_mat33() {
        let m = [[2.0, 0.5, 3.0], [-1.0, 1.5, 4.0], [0.0, 0.0, 1.0]];
        let inv = inverse_mat33(&m).unwrap();
        let mut prod = [[0.0; 3]; 3];
        matmul33(&m, &inv, &mut prod);
        for (i, row) in prod.iter().enumerate() {
            for (j, val) in row.iter().enumerate() {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(*val, expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_inverse_mat33_singular() {
        let m = [[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [0.0, 0.0, 1.0]];
        assert!(inverse_mat33(&m).is_none());
    }

    #[test]
    fn test_normalize_mat33_inplace() {
        let mut m = [[2.0, 0.0, 4.0], [0.0, 2.0, 6.0], [0.0, 0.0, 2.0]];
        normalize_mat33_inplace(&mut m);
        assert_eq!(m, [[1.0, 0.0, 2.0], [0.0, 1.0, 3.0], [0.0, 0.0, 1.0]]);
    }
}
