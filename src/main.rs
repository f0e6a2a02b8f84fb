//! One-shot evaluation: build a network from a JSON spec, run a single
//! forward/backward pass over an IDX dataset and report loss, accuracy and
//! gradient norms. Parameter updates are left to an external optimizer.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::info;
use rand::{rngs::StdRng, SeedableRng};

use sgd_blocks::{accuracy, CrossEntropyLoss, Dataset, Layer, NetworkSpec};

#[derive(Parser, Debug)]
#[command(name = "sgd-blocks")]
#[command(about = "Evaluate one forward/backward pass of a network on an IDX dataset", long_about = None)]
struct Args {
    /// Network architecture (JSON)
    spec: PathBuf,

    /// IDX3 image file
    images: PathBuf,

    /// IDX1 label file
    labels: PathBuf,

    /// Only use the first N samples
    #[arg(long)]
    limit: Option<usize>,

    /// Seed for weight initialization
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn run(args: &Args) -> sgd_blocks::Result<()> {
    let spec = NetworkSpec::load_json(&args.spec)?;
    let mut network = spec.build(&mut StdRng::seed_from_u64(args.seed))?;

    let mut dataset = Dataset::load(&args.images, &args.labels)?;
    if let Some(n) = args.limit {
        dataset = dataset.take(n);
    }
    info!(
        "{} samples of {}×{}, {} parameters",
        dataset.len(), dataset.rows, dataset.cols, network.parameter_count()
    );

    let scores = network.forward(&dataset.features)?;
    let (loss, grad) = CrossEntropyLoss::compute(&dataset.labels, &scores)?;
    let acc = accuracy(&scores, &dataset.labels)?;
    network.backward(&grad)?;

    println!("network:  {}", spec.name);
    println!("loss:     {:.6}", loss);
    println!("accuracy: {:.4}", acc);
    network.visit_parameters_mut(&mut |name, value, grad| {
        let norm = grad.map_or(f64::NAN, |g| g.frobenius_norm());
        println!("  {:<10} {:>4}×{:<4} |grad| = {:.6e}", name, value.rows, value.cols, norm);
    });
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
