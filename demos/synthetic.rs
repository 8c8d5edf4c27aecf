/// Validation demo for ferrite-valid on a synthetic 10-class digit-like task.
///
/// A small network is validated after each of a few edits to its output
/// layer, then left unchanged so the later passes stall and early stopping
/// ends the run. Best checkpoints land in the system temp directory.
///
/// Run with:
///   RUST_LOG=info cargo run --example synthetic

use std::error::Error;

use rand::{rngs::StdRng, Rng, SeedableRng};

use ferrite_valid::valid::runners_from_config;
use ferrite_valid::{ActivationFunction, BatchGenerator, InMemoryDataset, Network, ValidatorConfig};

const N_CLASSES: usize = 10;
const N_FEATURES: usize = 16;
const N_SAMPLES: usize = 500;

/// Each class gets a fixed random prototype; samples are noisy copies of it.
fn synthetic_dataset(rng: &mut StdRng) -> Result<InMemoryDataset, Box<dyn Error>> {
    let prototypes: Vec<Vec<f64>> = (0..N_CLASSES)
        .map(|_| (0..N_FEATURES).map(|_| rng.gen::<f64>()).collect())
        .collect();

    let mut samples: Vec<Vec<f64>> = Vec::with_capacity(N_SAMPLES);
    let mut labels = Vec::with_capacity(N_SAMPLES);
    for i in 0..N_SAMPLES {
        let class = i % N_CLASSES;
        samples.push(
            prototypes[class].iter().map(|p| p + (rng.gen::<f64>() - 0.5) * 0.2).collect(),
        );
        labels.push(class);
    }
    Ok(InMemoryDataset::from_samples(&samples, labels)?)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut rng = StdRng::seed_from_u64(2024);
    let dataset = synthetic_dataset(&mut rng)?;

    let out_dir = std::env::temp_dir().join("ferrite-valid-demo");
    std::fs::create_dir_all(&out_dir)?;

    let mut config = ValidatorConfig::new(out_dir.join("synthetic"));
    config.valid_metrics = vec!["accuracy".into(), "cross-entropy".into()];
    config.early_stopping = 2;

    let mut network = Network::with_rng(
        "synthetic",
        vec![
            (N_CLASSES, N_FEATURES, ActivationFunction::Identity),
            (N_CLASSES, N_CLASSES, ActivationFunction::Softmax),
        ],
        &mut rng,
    );
    let mut batches = BatchGenerator::new(dataset, 64)?;
    let mut runners = runners_from_config::<Network>(&config)?;

    println!("{:>5}  {:>14}  {:>10}  {:>10}  {:>8}", "Pass", "Metric", "Value", "Best", "Stalled");
    println!("{}", "─".repeat(55));

    for pass in 1..=8 {
        // Stand-in for a training step.
        if pass <= 4 {
            let out = &mut network.layers[1];
            for i in 0..N_CLASSES {
                for j in 0..N_CLASSES {
                    let target = if i == j { 4.0 } else { 0.0 };
                    let w = &mut out.weights.row_mut(i)[j];
                    *w += (target - *w) * 0.5;
                }
            }
        }

        for runner in &mut runners {
            let report = runner.validate(&mut network, &mut batches)?;
            println!(
                "{:>5}  {:>14}  {:>10.6}  {:>10.6}  {:>8}",
                pass,
                report.type_tag,
                report.metric,
                report.best.unwrap_or(f64::NAN),
                report.stalled
            );
        }

        if runners.iter().all(|r| r.should_stop()) {
            println!("\nEarly stopping after pass {}.", pass);
            break;
        }
    }

    println!("\nBest checkpoints written to {}", out_dir.display());
    Ok(())
}
