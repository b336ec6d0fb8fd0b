use lambda_runtime::{Error, LambdaEvent, service_fn};
use pipeline_forge::service::handler;
use tracing_subscriber::EnvFilter;

async fn handle_request(
    config: &handler::HandlerConfig,
    event: LambdaEvent<handler::ApiEvent>,
) -> Result<handler::ApiResponse, Error> {
    Ok(handler::handle(config, &event.payload))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .without_time()
        .init();

    let config = handler::HandlerConfig::from_env()?;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<handler::ApiEvent>| {
        let config = config.clone();
        async move { handle_request(&config, event).await }
    }))
    .await
}
