mod cli;

use huntress_mcp::{server, web, Config, Dispatcher};
use log::info;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli::build_cli().get_matches();
    let opts = cli::CliOptions::from_matches(&matches);

    cli::init_logging(opts.log_level.as_deref());

    if opts.version {
        println!("huntress-mcp {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let mut cfg = Config::from_env().map_err(anyhow::Error::msg)?;
    if opts.port.is_some() {
        cfg.port = opts.port;
    }
    if let Some(host) = opts.host {
        cfg.host = host;
    }

    let dispatcher = Arc::new(Dispatcher::new(&cfg)?);
    match cfg.port {
        Some(port) => {
            info!("HTTP mode; upstream {}", cfg.api_url);
            web::serve(&cfg.host, port, dispatcher).await
        }
        None => server::run_stdio_server(&dispatcher).await,
    }
}
