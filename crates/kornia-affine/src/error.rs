/// Errors returned by the affine solver and the RANSAC estimator.
#[derive(thiserror::Error, Debug)]
pub enum AffineError {
    /// The point set has no spread, so it cannot be conditioned.
    #[error("Degenerate point set: zero variance on both axes")]
    DegenerateInput,

    /// Source and target point sets have different sizes.
    #[error("Point set size mismatch: source has {left_len} points, target has {right_len}")]
    ShapeMismatch {
        /// Number of source points.
        left_len: usize,
        /// Number of target points.
        right_len: usize,
    },

    /// The linear solve did not produce a usable model.
    #[error("Affine solve failed: {0}")]
    SolveFailure(String),

    /// Not enough correspondences to fit a model.
    #[error("Need at least {required} correspondences, got {actual}")]
    InsufficientData {
        /// Minimum number of correspondences.
        required: usize,
        /// Number of correspondences provided.
        actual: usize,
    },

    /// A correspondence holds a NaN or infinite coordinate.
    #[error("Correspondence {index} has a non-finite coordinate")]
    NonFiniteInput {
        /// Position of the offending correspondence.
        index: usize,
    },

    /// The estimator configuration is out of range.
    #[error("Invalid RANSAC parameters: {0}")]
    InvalidParams(String),

    /// A keypoint match refers to a keypoint that does not exist.
    #[error("Match index {index} out of bounds for {len} keypoints")]
    MatchIndexOutOfBounds {
        /// The offending keypoint index.
        index: usize,
        /// Length of the keypoint array.
        len: usize,
    },
}
