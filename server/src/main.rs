mod decode;
mod inject;
mod server;
mod simulator;

use std::{env, error::Error, net::SocketAddr, sync::Arc};

use tracing_subscriber::EnvFilter;

use crate::inject::Injector;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:4433";
const MAX_CONNECTIONS: usize = 16;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync + 'static>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let addr: SocketAddr = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_BIND_ADDR.into())
        .parse()?;

    let injector = Arc::new(Injector::new()?);
    server::run_server(addr, MAX_CONNECTIONS, injector).await
}
