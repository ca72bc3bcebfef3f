use serde::{Deserialize, Serialize};

use crate::error::AffineError;

/// A point in image A paired with the point it matches in image B.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Correspondence {
    /// The point in the source image, in pixels.
    pub src: [f64; 2],
    /// The matching point in the target image, in pixels.
    pub dst: [f64; 2],
}

impl Correspondence {
    /// Create a new correspondence from a source and a target point.
    pub fn new(src: [f64; 2], dst: [f64; 2]) -> Self {
        Self { src, dst }
    }

    /// Whether all four coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.src
            .iter()
            .chain(self.dst.iter())
            .all(|v| v.is_finite())
    }
}

/// A descriptor match between a keypoint of image A and a keypoint of image B.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeypointMatch {
    /// Index of the keypoint in the first image.
    pub query: usize,
    /// Index of the matched keypoint in the second image.
    pub train: usize,
    /// Match confidence. Matches with a non-positive confidence are rejected.
    pub confidence: f64,
}

/// Build the correspondence list from two keypoint sets and their matches.
///
/// * `keypoints1` - Keypoint locations in the first image.
/// * `keypoints2` - Keypoint locations in the second image.
/// * `matches` - Matches between the two keypoint sets.
///
/// Matches whose confidence is not strictly positive are dropped. The output keeps the
/// order of `matches`.
///
/// # Errors
///
/// [`AffineError::MatchIndexOutOfBounds`] if a kept match refers to a missing keypoint.
pub fn correspondences_from_matches(
    keypoints1: &[[f64; 2]],
    keypoints2: &[[f64; 2]],
    matches: &[KeypointMatch],
) -> Result<Vec<Correspondence>, AffineError> {
    let mut correspondences = Vec::with_capacity(matches.len());
    for m in matches.iter().filter(|m| m.confidence > 0.0) {
        let src = keypoints1
            .get(m.query)
            .ok_or(AffineError::MatchIndexOutOfBounds {
                index: m.query,
                len: keypoints1.len(),
            })?;
        let dst = keypoints2
            .get(m.train)
            .ok_or(AffineError::MatchIndexOutOfBounds {
                index: m.train,
                len: keypoints2.len(),
            })?;
        correspondences.push(Correspondence::new(*src, *dst));
    }
    Ok(correspondences)
}

/// Split correspondences into their source and target point sets.
pub fn split_correspondences(correspondences: &[Correspondence]) -> (Vec<[f64; 2]>, Vec<[f64; 2]>) {
    correspondences.iter().map(|c| (c.src, c.dst)).unzip()
}
