use logic_nn::{LogicGate, Network, NetworkParams};

fn main() -> Result<(), logic_nn::NetError> {
    let data = LogicGate::Xor.dataset();
    let params = NetworkParams { max_epoch: 200_000, ..NetworkParams::default() }.sized_for(&data);

    let mut network = Network::new(&params);
    let summary = network.train(&data.inputs, &data.expected)?;
    println!(
        "Stopped after {} epochs ({:?}), last sample error = {:.8}",
        summary.epoch, summary.reason, summary.training_error
    );

    for input in &data.inputs {
        println!("Input: {:?} -> Output: {:.4}", input, network.predict(input)?[0]);
    }
    Ok(())
}
