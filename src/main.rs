use std::sync::Arc;

use anyhow::Context;

use log::{error, info};

use fastcgi_router::{config, handlers, server::Server};

const DEFAULT_CONFIG_FILE: &str = "./config/config.json";

async fn try_main() -> anyhow::Result<()> {
    let config_file = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_owned());

    let configuration = config::read_configuration(config_file)
        .await
        .context("read_configuration error")?;

    let handlers = handlers::create_handlers(configuration.router_configuration())
        .context("create_handlers error")?;

    info!("registered {} routes", handlers.router().len());

    let server = Server::new(Arc::new(handlers), configuration.server_configuration());

    server.run().await
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_nanos()
        .init();

    if let Err(err) = try_main().await {
        error!("fatal error in main: {:#}", err);
        std::process::exit(1);
    }
}
