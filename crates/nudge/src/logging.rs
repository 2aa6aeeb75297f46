use std::path::PathBuf;

use directories::ProjectDirs;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt, Layer,
};

pub fn initialize_logging() -> anyhow::Result<()> {
    let project = match ProjectDirs::from("io", "nudge", env!("CARGO_PKG_NAME")) {
        Some(p) => p.data_local_dir().to_path_buf(),
        None => PathBuf::from(".").join(".data"),
    };

    std::fs::create_dir_all(&project)?;
    let log_path = project.join("nudge.log");

    let log_file = std::fs::File::create(log_path)?;
    std::env::set_var(
        "RUST_LOG",
        std::env::var("RUST_LOG")
            .or_else(|_| std::env::var("NUDGE_LOG_LEVEL"))
            .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME"))),
    );
    let file_subscriber = tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_filter(tracing_subscriber::filter::EnvFilter::from_default_env());
    tracing_subscriber::registry()
        .with(file_subscriber)
        .with(ErrorLayer::default())
        .init();
    Ok(())
}
