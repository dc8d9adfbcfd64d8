use clap::Parser;
use iamgate::AuthGate;
use iamgate_reqwest::IamClient;
use iamgate_server::config::ServerArgs;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    dotenvy::dotenv().ok();
    color_eyre::install()?;
    iamgate_server::init_tracing("info");

    let args = ServerArgs::parse();

    let client = IamClient::new(args.iam.iam_config())?;
    let app = iamgate_server::app(AuthGate::new(client));

    let listener = tokio::net::TcpListener::bind(args.listen_addr()).await?;

    tracing::info!(
        addr = %listener.local_addr()?,
        environment = %args.environment,
        "iamgate example server listening"
    );
    tracing::info!(
        base_url = %args.iam.base_url,
        client_id = %args.iam.client_id,
        "authenticating requests against identity service"
    );
    tracing::info!("press Ctrl+C to exit");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "unable to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received, draining connections");
}
