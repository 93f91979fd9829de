use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use eve_deploy::artifactory::HttpArtifactResolver;
use eve_deploy::blob::S3BlobStore;
use eve_deploy::callback::{PlanCallback, ReqwestCallback};
use eve_deploy::config::{ArtifactoryConfig, Config};
use eve_deploy::cron::DeploymentCron;
use eve_deploy::db::migrations::migrate;
use eve_deploy::db::repo::Repo;
use eve_deploy::deployment_queue::DeploymentQueue;
use eve_deploy::plan::PlanGenerator;
use eve_deploy::prelude::*;
use eve_deploy::queue::SqsQueueClient;
use eve_deploy::{artifactory, blob, metrics, queue};

#[derive(Parser, Debug)]
#[command(name = "eve-deploy", about = "Continuous-deployment control plane")]
struct Args {
    /// Run pending database migrations and exit, without starting the
    /// worker or cron. Mirrors the original's `--migrate` / `--server`
    /// split.
    #[arg(long)]
    migrate_only: bool,
}

#[tokio::main]
#[allow(clippy::expect_used)]
async fn main() -> AppResult<()> {
    let args = Args::parse();

    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .filter_module("rusqlite_migration", log::LevelFilter::Warn)
        .filter_module("aws_sdk_sqs", log::LevelFilter::Warn)
        .filter_module("aws_sdk_s3", log::LevelFilter::Warn)
        .filter_module("aws_smithy_runtime", log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let config = Config::from_env()?;

    let manager = SqliteConnectionManager::file(&config.database_path);
    let pool = Pool::new(manager).map_err(AppError::from)?;
    {
        let conn = pool.get()?;
        migrate(conn)?;
    }

    if args.migrate_only {
        log::info!("migrations complete, exiting (--migrate-only)");
        return Ok(());
    }

    let registry = prometheus::Registry::new();
    let exporter = opentelemetry_prometheus::exporter()
        .with_registry(registry.clone())
        .build()
        .expect("failed to build OpenTelemetry Prometheus exporter");
    let provider = opentelemetry_sdk::metrics::MeterProvider::builder()
        .with_reader(exporter)
        .build();
    opentelemetry::global::set_meter_provider(provider);
    metrics::init(&registry).expect("failed to initialize metrics");

    let repo = Repo::new(pool);

    let artifactory_config = ArtifactoryConfig::from_env()?;
    let http_client = reqwest::Client::new();
    let resolver: Arc<dyn artifactory::ArtifactResolver> = Arc::new(HttpArtifactResolver::new(
        http_client.clone(),
        artifactory_config,
    ));

    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.aws_region.clone()))
        .load()
        .await;
    let sqs_client = aws_sdk_sqs::Client::new(&aws_config);
    let s3_client = aws_sdk_s3::Client::new(&aws_config);

    let queue: Arc<dyn queue::QueueClient> = Arc::new(SqsQueueClient::new(sqs_client));
    let blob: Arc<dyn blob::BlobStore> = Arc::new(S3BlobStore::new(s3_client, config.s3_bucket.clone()));
    let callback: Arc<dyn PlanCallback> = Arc::new(ReqwestCallback::new(
        http_client,
        Duration::from_secs(config.http_callback_timeout_seconds),
    ));

    let generator = Arc::new(PlanGenerator::new(
        repo.clone(),
        Arc::clone(&resolver),
        Arc::clone(&queue),
        config.api_q_url.clone(),
    ));

    let worker = Arc::new(DeploymentQueue::new(
        repo.clone(),
        resolver,
        Arc::clone(&queue),
        blob,
        callback,
        config.api_q_url.clone(),
        config.api_q_max_number_of_message,
        config.api_q_wait_time_second,
        config.api_q_visibility_timeout,
        Duration::from_secs(config.api_q_worker_timeout_seconds),
    ));

    let cron = Arc::new(DeploymentCron::new(
        repo,
        Arc::clone(&generator),
        Duration::from_secs(config.cron_timeout_seconds),
    ));

    let shutdown = CancellationToken::new();

    let worker_task = tokio::spawn(Arc::clone(&worker).start(shutdown.clone()));
    let cron_task = tokio::spawn(Arc::clone(&cron).run(shutdown.clone()));

    tokio::signal::ctrl_c().await.ok();
    log::info!("shutdown signal received, stopping worker and cron");
    shutdown.cancel();

    let _ = tokio::join!(worker_task, cron_task);

    Ok(())
}
