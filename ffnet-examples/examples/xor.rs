use ffnet::net::gradcheck::check_gradients;
use ffnet::scoring::{evaluate, MulticlassScorer};
use ffnet::train::Trainer;
use ffnet_examples::util::{xor_data, xor_net, xor_params};

pub fn main() -> ffnet::Result<()> {
    tracing_subscriber::fmt::init();

    let data = xor_data::<f64>()?;
    let mut net = xor_net::<f64>(0x0a5d)?;

    let trace = net.forward(data.inputs())?;
    println!("Activations:");
    for activation in trace.iter() {
        println!("{activation:?}");
    }

    let grads = net.backward(trace, data.targets())?;
    println!("Parameter gradients:");
    for (i, g) in grads.iter().enumerate() {
        println!("  layer {i}: {g:?}");
    }

    let report = check_gradients(&mut net, data.inputs(), data.targets(), 1e-4, 1e-6)?;
    println!(
        "Gradient check passed for {} parameters (max error {:e})",
        report.checked, report.max_error
    );

    let trainer = Trainer::new(xor_params())?;
    let report = trainer.train(&mut net, &data, &data)?;
    println!(
        "Trained {} epochs, cost {:.4} -> {:.4}",
        report.epochs,
        report.minibatch_costs.first().copied().unwrap_or_default(),
        report.training_costs.last().copied().unwrap_or_default()
    );
    println!("Predictions: {:?}", net.predict(data.inputs())?);

    let mut scorer = MulticlassScorer::for_net(&net);
    evaluate(&net, &data, 4, &mut scorer)?;
    scorer.print_report();
    Ok(())
}
