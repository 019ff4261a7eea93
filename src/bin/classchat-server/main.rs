use std::{net::SocketAddr, sync::Arc};

use anyhow::Context as _;

use classchat::{serve, store::Connection, Config, LocalGateway};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    simple_env_load::load_env_from([".dev.env", ".secrets.env"]);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load(Config::FILE)?;

    let conn = Connection::open(&config.server.database)
        .with_context(|| format!("open database {}", config.server.database))?;
    let gateway = Arc::new(LocalGateway::new(conn));

    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("parse bind address {}", config.server.bind))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("bind tcp listener")?;
    log::info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, serve::router(gateway).into_make_service())
        .await
        .context("server shutdown")?;

    Ok(())
}
