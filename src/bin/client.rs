use tracing::info;
use tracing_subscriber::EnvFilter;
use wordtally::config::ClientConfig;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::load()?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        addr = %config.addr,
        file = %config.file.display(),
        "Starting wordtally client"
    );

    let stats = wordtally::client::run(&config)?;
    print!("{stats}");
    Ok(())
}
