use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use logic_nn::{spawn_training, EpochStats, LogicGate, NetError, Network, NetworkParams};

fn endless_params(seed: u64) -> NetworkParams {
    NetworkParams { global_error: 0.0, max_epoch: usize::MAX, seed: Some(seed), ..NetworkParams::default() }
}

#[test]
fn stop_takes_effect_within_one_dataset_cycle() {
    let data = LogicGate::Xor.dataset();
    let mut network = Network::new(&endless_params(9));
    let stop = network.stop_handle();
    // rendezvous channel: the trainer cannot finish another epoch until we receive
    let (tx, rx) = mpsc::sync_channel::<EpochStats>(0);

    let worker = thread::spawn(move || {
        let result = network.train_with_progress(&data.inputs, &data.expected, Some(&tx));
        (network.epoch(), result)
    });

    let seen = rx.recv().unwrap();
    stop.stop();
    let extra: Vec<EpochStats> = rx.iter().collect();
    let (epoch, result) = worker.join().unwrap();

    assert_eq!(result, Err(NetError::TrainingAborted { epoch }));
    assert!(epoch <= seen.epoch + 1, "stopped at {epoch}, last seen {}", seen.epoch);
    assert!(extra.len() <= 1);
}

#[test]
fn controller_can_cancel_background_run() {
    let data = LogicGate::Xor.dataset();
    let handle = spawn_training(Network::new(&endless_params(4)), data.clone());

    thread::sleep(Duration::from_millis(10));
    handle.stop();
    handle.stop();

    let report = handle.wait().expect("worker reports after cancellation");
    let epoch = match report.outcome {
        Err(NetError::TrainingAborted { epoch }) => epoch,
        other => panic!("expected an aborted run, got {other:?}"),
    };
    assert_eq!(report.network.epoch(), epoch);

    // the partially trained network is still usable for inference
    let mut network = report.network;
    let out = network.predict(&data.inputs[0]).unwrap();
    assert_eq!(out.len(), 1);
    assert!(out[0] > 0.0 && out[0] < 1.0);
}
