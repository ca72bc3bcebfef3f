use crate::error::AffineError;

/// Similarity transform mapping raw coordinates into a zero-mean, unit-scale frame.
///
/// As a matrix it reads `[[s, 0, -s * mx], [0, s, -s * my], [0, 0, 1]]`, where `s` is the
/// isotropic scale and `(mx, my)` the mean of the point set it was built for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConditioningMatrix {
    scale: f64,
    mean: [f64; 2],
}

impl ConditioningMatrix {
    /// Build a conditioning transform from a scale and a centre.
    pub fn new(scale: f64, mean: [f64; 2]) -> Self {
        Self { scale, mean }
    }

    /// The isotropic scale `1 / maxstd`.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// The centre removed by the transform.
    pub fn mean(&self) -> [f64; 2] {
        self.mean
    }

    /// The transform as a row-major 3x3 matrix.
    pub fn matrix(&self) -> [[f64; 3]; 3] {
        let s = self.scale;
        [
            [s, 0.0, -self.mean[0] * s],
            [0.0, s, -self.mean[1] * s],
            [0.0, 0.0, 1.0],
        ]
    }

    /// The inverse transform as a row-major 3x3 matrix.
    pub fn inverse_matrix(&self) -> [[f64; 3]; 3] {
        let s_inv = 1.0 / self.scale;
        [
            [s_inv, 0.0, self.mean[0]],
            [0.0, s_inv, self.mean[1]],
            [0.0, 0.0, 1.0],
        ]
    }

    /// Map a raw point into the conditioned frame.
    #[inline]
    pub fn apply(&self, p: &[f64; 2]) -> [f64; 2] {
        [
            (p[0] - self.mean[0]) * self.scale,
            (p[1] - self.mean[1]) * self.scale,
        ]
    }
}

/// Source and target point sets conditioned for the same solve.
#[derive(Clone, Debug)]
pub struct ConditionedPair {
    /// Conditioned source points.
    pub src: Vec<[f64; 2]>,
    /// Conditioned target points.
    pub dst: Vec<[f64; 2]>,
    /// Transform applied to the source points.
    pub src_conditioning: ConditioningMatrix,
    /// Transform applied to the target points.
    pub dst_conditioning: ConditioningMatrix,
}

fn mean_2d(points: &[[f64; 2]]) -> [f64; 2] {
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
    [sx / n, sy / n]
}

/// Condition a point set by its own mean and largest per-axis standard deviation.
///
/// * `points` - The raw 2d points, at least one.
///
/// # Returns
///
/// The conditioned points and the transform that produced them.
///
/// # Errors
///
/// [`AffineError::DegenerateInput`] when all points coincide, so that no scale can be derived.
pub fn condition_points(
    points: &[[f64; 2]],
) -> Result<(Vec<[f64; 2]>, ConditioningMatrix), AffineError> {
    if points.is_empty() {
        return Err(AffineError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }

    let mean = mean_2d(points);

    // population standard deviation per axis
    let n = points.len() as f64;
    let (var_x, var_y) = points.iter().fold((0.0, 0.0), |(vx, vy), p| {
        let dx = p[0] - mean[0];
        let dy = p[1] - mean[1];
        (vx + dx * dx, vy + dy * dy)
    });
    let max_std = (var_x / n).sqrt().max((var_y / n).sqrt());

    let scale = 1.0 / max_std;
    if !max_std.is_finite() || !scale.is_finite() {
        return Err(AffineError::DegenerateInput);
    }

    let conditioning = ConditioningMatrix::new(scale, mean);
    let conditioned = points.iter().map(|p| conditioning.apply(p)).collect();

    Ok((conditioned, conditioning))
}

/// Condition a source and a target point set for a joint solve.
///
/// The target set reuses the scale derived from the source set and is only centred on its
/// own mean. The null-space extraction downstream relies on both sets sharing one scale.
///
/// # Errors
///
/// - [`AffineError::ShapeMismatch`] if the sets differ in size.
/// - [`AffineError::DegenerateInput`] if the source points all coincide.
pub fn condition_point_pair(
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
) -> Result<ConditionedPair, AffineError> {
    if src.len() != dst.len() {
        return Err(AffineError::ShapeMismatch {
            left_len: src.len(),
            right_len: dst.len(),
        });
    }

    let (src_cond, src_conditioning) = condition_points(src)?;

    let dst_conditioning = ConditioningMatrix::new(src_conditioning.scale(), mean_2d(dst));
    let dst_cond = dst.iter().map(|p| dst_conditioning.apply(p)).collect();

    Ok(ConditionedPair {
        src: src_cond,
        dst: dst_cond,
        src_conditioning,
        dst_conditioning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg;
    use approx::assert_relative_eq;

    #[test]
    fn test_condition_points_zero_mean_unit_scale() -> Result<(), AffineError> {
        let points = [[0.0, 0.0], [10.0, 0.0], [0.0, 10.0], [10.0, 10.0]];
        let (cond, c) = condition_points(&points)?;

        assert_eq!(c.mean(), [5.0, 5.0]);
        assert_relative_eq!(c.scale(), 0.2, epsilon = 1e-12);

        let mean = mean_2d(&cond);
        assert_relative_eq!(mean[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(mean[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(cond[3][0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(cond[3][1], 1.0, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_condition_points_uses_largest_axis_std() -> Result<(), AffineError> {
        // std x = 2, std y = 0.5
        let points = [[-2.0, 0.5], [2.0, -0.5]];
        let (_, c) = condition_points(&points)?;
        assert_relative_eq!(c.scale(), 0.5, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_condition_points_matches_matrix_form() -> Result<(), AffineError> {
        let points = [[3.0, -1.0], [7.5, 2.0], [-4.0, 9.0]];
        let (cond, c) = condition_points(&points)?;
        let m = c.matrix();
        for (p, q) in points.iter().zip(cond.iter()) {
            let mut out = [0.0; 3];
            linalg::mat33_mul_vec3(&m, &[p[0], p[1], 1.0], &mut out);
            assert_relative_eq!(out[0], q[0], epsilon = 1e-12);
            assert_relative_eq!(out[1], q[1], epsilon = 1e-12);
            assert_eq!(out[2], 1.0);
        }

        let mut prod = [[0.0; 3]; 3];
        linalg::matmul33(&c.inverse_matrix(), &m, &mut prod);
        for (i, row) in prod.iter().enumerate() {
            for (j, val) in row.iter().enumerate() {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(*val, expected, epsilon = 1e-12);
            }
        }
        Ok(())
    }

    #[test]
    fn test_condition_points_coincident() {
        let points = [[4.0, 2.0], [4.0, 2.0], [4.0, 2.0]];
        let res = condition_points(&points);
        assert!(matches!(res, Err(AffineError::DegenerateInput)));
    }

    #[test]
    fn test_condition_points_empty() {
        let res = condition_points(&[]);
        assert!(matches!(
            res,
            Err(AffineError::InsufficientData {
                required: 1,
                actual: 0
            })
        ));
    }

    #[test]
    fn test_condition_pair_shares_source_scale() -> Result<(), AffineError> {
        let src = [[0.0, 0.0], [10.0, 0.0], [0.0, 10.0], [10.0, 10.0]];
        // target is four times larger and shifted, its own std would give another scale
        let dst = [[100.0, 50.0], [140.0, 50.0], [100.0, 90.0], [140.0, 90.0]];
        let pair = condition_point_pair(&src, &dst)?;

        assert_eq!(pair.src_conditioning.scale(), pair.dst_conditioning.scale());
        assert_eq!(pair.dst_conditioning.mean(), [120.0, 70.0]);

        let mean = mean_2d(&pair.dst);
        assert_relative_eq!(mean[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(mean[1], 0.0, epsilon = 1e-12);
        // shared scale keeps the 4x ratio in the conditioned frame
        assert_relative_eq!(pair.dst[3][0], 4.0, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_condition_pair_target_may_collapse() -> Result<(), AffineError> {
        let src = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let dst = [[3.0, 3.0], [3.0, 3.0], [3.0, 3.0]];
        let pair = condition_point_pair(&src, &dst)?;
        assert!(pair.dst.iter().all(|p| p[0] == 0.0 && p[1] == 0.0));
        Ok(())
    }

    #[test]
    fn test_condition_pair_shape_mismatch() {
        let src = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let dst = [[0.0, 0.0], [1.0, 0.0]];
        let res = condition_point_pair(&src, &dst);
        assert!(matches!(
            res,
            Err(AffineError::ShapeMismatch {
                left_len: 3,
                right_len: 2
            })
        ));
    }
}
