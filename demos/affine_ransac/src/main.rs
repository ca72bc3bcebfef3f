use argh::FromArgs;
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use kornia_affine::{
    affine_from_correspondences, ransac_affine_par, ransac_affine_with_rng, AffineMatrix,
    RansacParams,
};
use serde::Serialize;

mod input;

#[derive(FromArgs)]
/// Estimate the affine transform between two images from point correspondences
struct Args {
    /// path to the JSON file with the correspondences or keypoint matches
    #[argh(option, short = 'i')]
    input: PathBuf,

    /// number of RANSAC iterations
    #[argh(option, default = "10")]
    iterations: usize,

    /// residual threshold in pixels for the consensus set
    #[argh(option, default = "10.0")]
    threshold: f64,

    /// minimum consensus set size
    #[argh(option, default = "5")]
    min_consensus: usize,

    /// seed of the random sampler
    #[argh(option)]
    seed: Option<u64>,

    /// evaluate the RANSAC trials in parallel
    #[argh(switch)]
    parallel: bool,

    /// refit the selected model on its consensus set
    #[argh(switch)]
    refit: bool,
}

#[derive(Serialize)]
struct RansacReport {
    model: AffineMatrix,
    inverse: Option<AffineMatrix>,
    max_error: f64,
    num_inliers: usize,
    iteration: usize,
}

#[derive(Serialize)]
struct Report {
    num_correspondences: usize,
    ransac: Option<RansacReport>,
    fit_all: Option<AffineMatrix>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let correspondences = input::load_correspondences(&args.input)?;
    log::info!("Loaded {} correspondences", correspondences.len());

    let params = RansacParams {
        iterations: args.iterations,
        error_threshold: args.threshold,
        min_consensus: args.min_consensus,
        random_seed: args.seed,
        refit_consensus: args.refit,
        ..Default::default()
    };

    // stop the RANSAC loop early on Ctrl-C and keep the best model so far
    let cancel_token = Arc::new(AtomicBool::new(false));
    ctrlc::set_handler({
        let cancel_token = cancel_token.clone();
        move || {
            println!("Received Ctrl-C signal. Sending cancel signal !!");
            cancel_token.store(true, Ordering::SeqCst);
        }
    })?;

    let result = if args.parallel {
        ransac_affine_par(&correspondences, &params, Some(&cancel_token))?
    } else {
        let mut rng = params.rng();
        ransac_affine_with_rng(&correspondences, &params, &mut rng, Some(&cancel_token))?
    };

    let ransac = match result {
        Some(res) => Some(RansacReport {
            model: res.model,
            inverse: res.model.inverse().ok(),
            max_error: res.max_error,
            num_inliers: res.consensus.len(),
            iteration: res.iteration,
        }),
        None => {
            println!("RANSAC: no model found");
            None
        }
    };

    let fit_all = match affine_from_correspondences(&correspondences) {
        Ok(model) => Some(model),
        Err(e) => {
            log::warn!("Fit on all correspondences failed: {e}");
            None
        }
    };

    let report = Report {
        num_correspondences: correspondences.len(),
        ransac,
        fit_all,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
