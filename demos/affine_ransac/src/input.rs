use std::{fs::File, io::BufReader, path::Path};

use kornia_affine::{correspondences_from_matches, Correspondence, KeypointMatch};
use serde::Deserialize;

/// The two accepted layouts of the input file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MatchFile {
    Correspondences {
        correspondences: Vec<Correspondence>,
    },
    Keypoints {
        keypoints1: Vec<[f64; 2]>,
        keypoints2: Vec<[f64; 2]>,
        matches: Vec<KeypointMatch>,
    },
}

/// Read the correspondence list from a JSON file.
pub fn load_correspondences(
    path: &Path,
) -> Result<Vec<Correspondence>, Box<dyn std::error::Error>> {
    let reader = BufReader::new(File::open(path)?);
    let correspondences = match serde_json::from_reader(reader)? {
        MatchFile::Correspondences { correspondences } => correspondences,
        MatchFile::Keypoints {
            keypoints1,
            keypoints2,
            matches,
        } => correspondences_from_matches(&keypoints1, &keypoints2, &matches)?,
    };
    Ok(correspondences)
}
