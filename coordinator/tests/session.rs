use comms::specs::{env::EnvSpec, policy::PolicySpec};
use coordinator::{Collector, Coordinator, CoordinatorError, LocalPool, RolloutPool};
use es_core::{EsConfig, EsLearner, NoiseTable};

fn config() -> EsConfig {
    EsConfig {
        num_workers: 2,
        episodes_per_batch: 10,
        train_batch_size: 40,
        noise_size: 20_000,
        eval_prob: 0.2,
        min_task_runtime_secs: 0.,
        env: EnvSpec::CartPole { max_steps: 20 },
        policy: PolicySpec::Linear,
        seed: Some(7),
        ..Default::default()
    }
}

fn coordinator(config: EsConfig) -> Coordinator<LocalPool> {
    let noise = NoiseTable::create(config.noise_size, config.noise_seed);
    let pool = LocalPool::new(&config, &noise).unwrap();
    let learner = EsLearner::from_config(config, noise).unwrap();
    Coordinator::new(pool, learner)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn iterations_meet_their_quotas_and_move_the_parameters() {
    let mut coordinator = coordinator(config());
    let initial = coordinator.learner().theta().to_vec();

    assert_eq!(coordinator.pool().num_workers(), 2);

    let first = coordinator.train_iteration().await.unwrap();
    let second = coordinator.train_iteration().await.unwrap();

    for report in [&first, &second] {
        assert!(report.info.episodes_this_iter >= 10);
        assert!(report.timesteps_this_iter >= 40);
        assert!(report.info.weights_norm.is_finite());
    }

    assert_eq!(
        second.info.episodes_so_far,
        first.info.episodes_this_iter + second.info.episodes_this_iter
    );
    assert_eq!(
        second.timesteps_total,
        first.timesteps_this_iter + second.timesteps_this_iter
    );
    assert_eq!(coordinator.iteration(), 2);
    assert_eq!(coordinator.learner().step_count(), 2);
    assert_ne!(coordinator.learner().theta(), &initial[..]);
    assert!(coordinator.learner().filter().running().count() > 0);

    let theta = coordinator.shutdown().await.unwrap();
    assert_eq!(theta.len(), initial.len());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn restoring_a_checkpoint_resumes_from_it() {
    let mut trained = coordinator(config());
    trained.train_iteration().await.unwrap();
    let checkpoint = trained.checkpoint();

    let mut resumed = coordinator(config());
    resumed.restore(checkpoint.clone()).await.unwrap();

    assert_eq!(resumed.learner().theta(), &checkpoint.weights[..]);
    assert_eq!(resumed.learner().episodes_so_far(), checkpoint.episodes_so_far);
    assert_eq!(resumed.learner().filter().as_serializable(), checkpoint.filter);

    let report = resumed.train_iteration().await.unwrap();
    assert!(report.info.episodes_so_far > checkpoint.episodes_so_far);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn mismatched_checkpoints_are_rejected() {
    let mut coordinator = coordinator(config());
    let mut checkpoint = coordinator.checkpoint();
    checkpoint.weights.push(0.);

    assert!(coordinator.restore(checkpoint).await.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn a_failed_round_leaves_the_pool_usable() {
    let config = config();
    let noise = NoiseTable::create(config.noise_size, config.noise_seed);
    let learner = EsLearner::from_config(config.clone(), noise.clone()).unwrap();
    let mut pool = LocalPool::new(&config, &noise).unwrap();
    let mut collector = Collector::new();

    let res = collector.collect(&mut pool, &[0.; 3], 1, 1).await;
    assert!(matches!(
        res,
        Err(CoordinatorError::RolloutFailure { worker_id: 0, .. })
    ));
    assert_eq!(pool.num_workers(), 2);

    let collected = collector
        .collect(&mut pool, learner.theta(), 4, 10)
        .await
        .unwrap();

    assert!(collected.episodes >= 4);
    assert!(collected.bundles.iter().all(|b| b.round >= 2));
    assert_eq!(collected.bundles.len() % 2, 0);
}
