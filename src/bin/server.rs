use tracing::info;
use tracing_subscriber::EnvFilter;
use wordtally::config::ServerConfig;
use wordtally::server::Server;
use wordtally::shutdown::ShutdownFlag;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::load()?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        addr = %config.addr,
        backlog = config.backlog,
        max_connections = config.max_connections,
        "Starting wordtally server"
    );

    let shutdown = ShutdownFlag::new();
    shutdown.register_signals()?;

    let mut server = Server::bind(&config, shutdown)?;
    server.run()?;
    Ok(())
}
