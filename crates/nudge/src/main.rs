mod analyze;
mod cli;
mod config;
mod links;
mod logging;
mod notifier;
mod render;
mod scheduler;
mod signals;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::initialize_logging()?;

    tracing::debug!("starting app");

    cli::run().await?;

    Ok(())
}
