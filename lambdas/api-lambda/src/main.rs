use lambda_http::{run, service_fn, Error, Request};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use vst_atoms::{MemoryStore, ObjectStore};
use vst_shared::{AppState, Config, MediaBackend, S3Store, SesMailer};

mod http_handler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .without_time()
        .init();

    let config = Config::from_env()?;
    let aws_config = aws_config::load_from_env().await;

    let store: Arc<dyn ObjectStore> = match config.media_backend {
        MediaBackend::S3 => Arc::new(S3Store::new(
            aws_sdk_s3::Client::new(&aws_config),
            config.media_bucket.clone(),
            config.media_public_base_url.clone(),
        )),
        MediaBackend::Memory => {
            tracing::warn!("Using the in-memory media store; nothing survives a cold start");
            Arc::new(MemoryStore::new(config.media_public_base_url.clone()))
        }
    };
    let mailer = Arc::new(SesMailer::new(aws_sdk_sesv2::Client::new(&aws_config)));

    let state = Arc::new(AppState {
        store,
        mailer,
        config,
    });

    run(service_fn(move |event: Request| {
        let state = state.clone();
        async move { http_handler::function_handler(event, state).await }
    }))
    .await
}
