use std::io;

use comms::{
    msg::{Command, Msg, Payload},
    specs::{
        env::EnvSpec,
        filter::FilterKind,
        policy::PolicySpec,
        worker::{RolloutSpec, WorkerSpec},
    },
};
use es_core::{EsErr, NoiseTable};
use tokio::io as tokio_io;
use worker::{WorkerBuilder, WorkerErr};

fn spec() -> WorkerSpec {
    WorkerSpec {
        worker_id: 0,
        env: EnvSpec::Pendulum { max_steps: 5 },
        policy: PolicySpec::Mlp { hidden: vec![4] },
        observation_filter: FilterKind::NoFilter,
        rollout: RolloutSpec {
            noise_stdev: 0.02,
            eval_prob: 0.,
            action_noise_std: 0.01,
            min_task_runtime_secs: 0.,
            timestep_limit: None,
        },
        seed: Some(1),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn wrong_parameter_length_is_reported_not_answered() -> io::Result<()> {
    let (sv_stream, wk_stream) = tokio_io::duplex(4096);

    let (sv_rx, sv_tx) = tokio_io::split(sv_stream);
    let (mut sv_rx, mut sv_tx) = comms::channel(sv_rx, sv_tx);

    let (wk_rx, wk_tx) = tokio_io::split(wk_stream);
    let (mut wk_rx, mut wk_tx) = comms::channel(wk_rx, wk_tx);

    let worker_task = tokio::spawn(async move {
        let worker = WorkerBuilder::bootstrap(&mut wk_rx, &mut wk_tx).await?;
        worker.run(wk_rx, wk_tx).await
    });

    sv_tx.send(&Msg::Control(Command::CreateWorker(spec()))).await?;
    comms::send_noise(NoiseTable::create(200, 2).as_slice(), 50, &mut sv_tx).await?;

    let Msg::Control(Command::Ready { num_params, .. }) = sv_rx.recv().await? else {
        panic!("expected ready");
    };
    // Pendulum: 3 observations, 4 hidden units, 1 torque.
    assert_eq!(num_params, 4 * 4 + 5);

    let params = vec![0.; num_params + 1];
    sv_tx.send(&Msg::Data(Payload::Params(&params))).await?;

    match sv_rx.recv().await? {
        Msg::Err(detail) => assert!(detail.contains("broadcast parameters"), "{detail}"),
        other => panic!("expected an error, got {}", other.kind()),
    }

    sv_tx.send(&Msg::Control(Command::Disconnect)).await?;
    let Msg::Control(Command::Disconnect) = sv_rx.recv().await? else {
        panic!("expected disconnect");
    };

    let metrics = worker_task.await.unwrap().unwrap();
    assert_eq!(metrics.failed_rounds, 1);
    assert_eq!(metrics.pairs, 0);
    Ok(())
}

#[tokio::test]
async fn bootstrap_requires_create_worker_first() -> io::Result<()> {
    let (sv_stream, wk_stream) = tokio_io::duplex(4096);
    let (_, sv_tx) = tokio_io::split(sv_stream);
    let (wk_rx, wk_tx) = tokio_io::split(wk_stream);

    let mut sv_tx = comms::channel(tokio_io::empty(), sv_tx).1;
    let (mut wk_rx, mut wk_tx) = comms::channel(wk_rx, wk_tx);

    sv_tx.send(&Msg::Control(Command::Disconnect)).await?;
    let res = WorkerBuilder::bootstrap(&mut wk_rx, &mut wk_tx).await;

    assert!(matches!(
        res,
        Err(WorkerErr::UnexpectedMessage { round: 0, .. })
    ));
    Ok(())
}

#[tokio::test]
async fn noise_table_smaller_than_the_policy_fails_bootstrap() -> io::Result<()> {
    let (sv_stream, wk_stream) = tokio_io::duplex(4096);
    let (_, sv_tx) = tokio_io::split(sv_stream);
    let (wk_rx, wk_tx) = tokio_io::split(wk_stream);

    let mut sv_tx = comms::channel(tokio_io::empty(), sv_tx).1;
    let (mut wk_rx, mut wk_tx) = comms::channel(wk_rx, wk_tx);

    sv_tx.send(&Msg::Control(Command::CreateWorker(spec()))).await?;
    comms::send_noise(&[0.5; 8], 4, &mut sv_tx).await?;

    let res = WorkerBuilder::bootstrap(&mut wk_rx, &mut wk_tx).await;
    assert!(matches!(res, Err(WorkerErr::Es(EsErr::Bounds { .. }))));
    Ok(())
}
