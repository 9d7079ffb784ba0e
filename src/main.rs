use sfserve::config::{Config, SchedulingMode};
use sfserve::error::StartupError;
use sfserve::handler::RequestHandler;
use sfserve::logger;
use sfserve::server::{self, ShutdownSignal};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional config file path (without extension), defaults to "config"
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
    let cfg = Config::load_from(&config_path).map_err(StartupError::from)?;

    logger::init(&cfg.logging)?;
    if let Err(e) = cfg.validate() {
        logger::log_error(&format!("Invalid configuration: {e}"));
        return Err(e.into());
    }

    // Multiplexed mode is single-threaded by construction
    let mut runtime_builder = match cfg.server.mode {
        SchedulingMode::Multiplexed => tokio::runtime::Builder::new_current_thread(),
        SchedulingMode::WorkerPerConnection => tokio::runtime::Builder::new_multi_thread(),
    };
    runtime_builder.enable_all();
    let runtime = runtime_builder.build().map_err(StartupError::Runtime)?;

    runtime.block_on(async_main(cfg))?;
    Ok(())
}

async fn async_main(cfg: Config) -> Result<(), StartupError> {
    // Fail on a bad document root before any socket exists
    let handler = RequestHandler::from_config(&cfg)?;
    let requested = cfg.socket_addr()?;
    let listener = server::bind(&cfg)?;
    let addr = listener.local_addr().unwrap_or(requested);

    logger::log_server_start(&addr, &cfg);

    let shutdown = ShutdownSignal::new();
    server::start_signal_handler(shutdown.clone());

    server::serve(&cfg, listener, handler, shutdown.subscribe()).await;
    Ok(())
}
