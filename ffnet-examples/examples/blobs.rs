use ffnet::net::initializer::RandomNetInitializer;
use ffnet::net::layer::{LinearLayer, LogisticLayer, SoftmaxOutputLayer};
use ffnet::net::NetBuilder;
use ffnet::scoring::{evaluate, MulticlassScorer};
use ffnet::train::Trainer;
use ffnet_examples::util::{gaussian_blobs, load_params};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

const NUM_CLASSES: usize = 10;
const NUM_FEATURES: usize = 64;
const HIDDEN_SIZE: usize = 20;

/// Usage: `blobs [params.json]`
pub fn main() -> ffnet::Result<()> {
    tracing_subscriber::fmt::init();

    let params_path = std::env::args().nth(1).map(PathBuf::from);
    let params = load_params(params_path.as_deref())?;
    info!(?params, "training parameters");

    let mut rng = StdRng::seed_from_u64(0xb10b);
    let data = gaussian_blobs::<f32, _>(&mut rng, NUM_CLASSES, NUM_FEATURES, 180, 0.8)?;
    let (train, rest) = data.split(0.4, &mut rng)?;
    let (validation, test) = rest.split(0.5, &mut rng)?;
    info!(
        train = train.len(),
        validation = validation.len(),
        test = test.len(),
        "split dataset"
    );

    let mut init = RandomNetInitializer::seed_from_u64(0xf1234567);
    let mut net = NetBuilder::new(NUM_FEATURES)
        .with_layer(LinearLayer::new(NUM_FEATURES, HIDDEN_SIZE, &mut init))
        .with_layer(LogisticLayer::new())
        .with_layer(LinearLayer::new(HIDDEN_SIZE, HIDDEN_SIZE, &mut init))
        .with_layer(LogisticLayer::new())
        .with_layer(LinearLayer::new(HIDDEN_SIZE, NUM_CLASSES, &mut init))
        .with_layer(SoftmaxOutputLayer::new())
        .build()?;

    let trainer = Trainer::new(params)?;
    let start = Instant::now();
    let report = trainer.train(&mut net, &train, &validation)?;
    let elapsed = start.elapsed();
    println!(
        "Training time for {} epochs and batch size {}: {} sec{}",
        report.epochs,
        params.batch_size,
        elapsed.as_secs_f32(),
        if report.stopped_early { " (stopped early)" } else { "" }
    );

    let mut scorer = MulticlassScorer::for_net(&net);
    evaluate(&net, &test, params.batch_size, &mut scorer)?;
    scorer.print_report();
    Ok(())
}
