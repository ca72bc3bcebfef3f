use crate::affine::AffineMatrix;
use crate::correspondence::Correspondence;

/// Euclidean distance between the mapped source point and the observed target point.
///
/// * `model` - The affine transform from source to target.
/// * `correspondence` - The observed correspondence.
#[inline]
pub fn reprojection_error(model: &AffineMatrix, correspondence: &Correspondence) -> f64 {
    let predicted = model.transform_point(&correspondence.src);
    (correspondence.dst[0] - predicted[0]).hypot(correspondence.dst[1] - predicted[1])
}

/// Reprojection errors of every correspondence under `model`, in input order.
pub fn reprojection_errors(model: &AffineMatrix, correspondences: &[Correspondence]) -> Vec<f64> {
    correspondences
        .iter()
        .map(|c| reprojection_error(model, c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_reprojection_error_exact() {
        let h = AffineMatrix::from_linear_translation([[1.0, 0.0], [0.0, 1.0]], [5.0, 10.0]);
        let c = Correspondence::new([2.0, 3.0], [7.0, 13.0]);
        assert_eq!(reprojection_error(&h, &c), 0.0);
    }

    #[test]
    fn test_reprojection_error_offset() {
        let h = AffineMatrix::identity();
        let c = Correspondence::new([1.0, 1.0], [4.0, 5.0]);
        assert_relative_eq!(reprojection_error(&h, &c), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_reprojection_errors_order() {
        let h = AffineMatrix::from_linear_translation([[2.0, 0.0], [0.0, 2.0]], [0.0, 0.0]);
        let corrs = [
            Correspondence::new([1.0, 0.0], [2.0, 0.0]),
            Correspondence::new([1.0, 0.0], [2.0, 3.0]),
            Correspondence::new([0.0, 1.0], [0.0, 1.0]),
        ];
        let errors = reprojection_errors(&h, &corrs);
        assert_eq!(errors.len(), 3);
        assert_relative_eq!(errors[0], 0.0);
        assert_relative_eq!(errors[1], 3.0, epsilon = 1e-12);
        assert_relative_eq!(errors[2], 1.0, epsilon = 1e-12);
    }
}
