//! Minimal worker serving one task type against a local engine gateway.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use procflow_worker::{
    handler_fn, GrpcEngineGateway, JobOutcome, JobWorkerBuilder, TaskConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let gateway = Arc::new(GrpcEngineGateway::connect("http://[::1]:26500").await?);

    let worker = JobWorkerBuilder::new()
        .gateway(gateway)
        .job_type_with(
            TaskConfig::new("ship-order")
                .with_max_concurrent_jobs(4)
                .with_lease_timeout(Duration::from_secs(30)),
            handler_fn(|job, _ctx| async move {
                let order_id: String = match job.variable("order_id") {
                    Ok(order_id) => order_id,
                    Err(err) => return JobOutcome::fail(err.to_string()),
                };
                info!(job_key = %job.key, order_id = %order_id, "shipping order");

                let mut variables = serde_json::Map::new();
                variables.insert("shipped".to_owned(), json!(true));
                JobOutcome::complete_with(variables)
            }),
        )
        .build()?;

    let handle = worker.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.shutdown();
        }
    });

    worker.run().await;
    Ok(())
}
