#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Kornia Affine
//!
//! Estimates the 2D affine transform that maps points of one image onto
//! another from a list of point correspondences, robustly to wrong matches.
//!
//! ## Example: Robust estimation
//!
//! ```rust
//! use kornia_affine::{ransac_affine, Correspondence, RansacParams};
//!
//! // a pure translation by (5, 10) seen through 12 correspondences
//! let correspondences = (0..12)
//!     .map(|i| {
//!         let (x, y) = ((i % 4) as f64 * 10.0, (i / 4) as f64 * 7.0);
//!         Correspondence::new([x, y], [x + 5.0, y + 10.0])
//!     })
//!     .collect::<Vec<_>>();
//!
//! let params = RansacParams {
//!     random_seed: Some(0),
//!     ..Default::default()
//! };
//!
//! if let Some(result) = ransac_affine(&correspondences, &params)? {
//!     println!("model: {:?}", result.model.as_array());
//! }
//! # Ok::<(), kornia_affine::AffineError>(())
//! ```

/// The affine matrix type and the conditioned DLT solver.
pub mod affine;

/// Similarity conditioning of point sets.
pub mod conditioning;

/// Point correspondences and their construction from keypoint matches.
pub mod correspondence;

/// Error types for the crate.
pub mod error;

/// Small fixed-size linear algebra helpers.
pub mod linalg;

pub mod ransac;

/// Reprojection residuals of affine models.
pub mod residual;

pub use affine::{affine_from_correspondences, affine_from_points, AffineMatrix};
pub use conditioning::{
    condition_point_pair, condition_points, ConditionedPair, ConditioningMatrix,
};
pub use correspondence::{
    correspondences_from_matches, split_correspondences, Correspondence, KeypointMatch,
};
pub use error::AffineError;
pub use ransac::{
    ransac_affine, ransac_affine_par, ransac_affine_with_rng, RansacParams, RansacResult,
};
pub use residual::{reprojection_error, reprojection_errors};
