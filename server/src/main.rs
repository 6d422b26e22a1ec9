use std::net::SocketAddr;

use jedigpt::Config;
use miette::{IntoDiagnostic, Result, WrapErr};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod routes;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("server=info,jedigpt=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env().wrap_err("Missing required environment variables")?;
    info!(
        endpoint = %config.endpoint,
        model = %config.model_name,
        deployment = %config.deployment,
        api_version = %config.api_version,
        "Using AOAI deployment"
    );

    let client = config.client()?;

    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
        .parse()
        .into_diagnostic()
        .wrap_err("Invalid BIND_ADDR")?;

    let app = routes::router(client);

    info!(%addr, "Jedi GPT API running");

    axum::Server::try_bind(&addr)
        .into_diagnostic()
        .wrap_err_with(|| format!("Could not bind {addr}"))?
        .serve(app.into_make_service())
        .await
        .into_diagnostic()?;

    Ok(())
}
