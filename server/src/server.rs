use std::{error::Error, net::SocketAddr, sync::Arc};

use quinn::{Endpoint, Incoming, ServerConfig};
use rustls::pki_types::{CertificateDer, PrivatePkcs8KeyDer};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error, info, warn};

use crate::decode::FrameDecoder;
use crate::inject::Injector;

const MAX_STREAM_DATA: usize = 64 * 1024;

pub(crate) async fn run_server(
    addr: SocketAddr,
    max_connections: usize,
    injector: Arc<Injector>,
) -> Result<(), Box<dyn Error + Send + Sync + 'static>> {
    let (endpoint, _server_cert) = make_server_endpoint(addr)?;
    info!("listening on {addr} with max {max_connections} connections");

    let connection_limit = Arc::new(Semaphore::new(max_connections));

    while let Some(incoming) = endpoint.accept().await {
        let permit = match Arc::clone(&connection_limit).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                error!("semaphore closed; shutting down accept loop");
                break;
            }
        };

        let injector_for_connection = Arc::clone(&injector);
        tokio::spawn(async move {
            handle_connection(incoming, permit, injector_for_connection).await;
        });
    }

    Ok(())
}

fn make_server_endpoint(
    bind_addr: SocketAddr,
) -> Result<(Endpoint, CertificateDer<'static>), Box<dyn Error + Send + Sync + 'static>> {
    let (server_config, server_cert) = configure_server()?;
    let endpoint = Endpoint::server(server_config, bind_addr)?;
    Ok((endpoint, server_cert))
}

fn configure_server()
-> Result<(ServerConfig, CertificateDer<'static>), Box<dyn Error + Send + Sync + 'static>> {
    let cert = rcgen::generate_simple_self_signed(vec!["localhost".into()])?;
    let cert_der = CertificateDer::from(cert.cert);
    let priv_key = PrivatePkcs8KeyDer::from(cert.signing_key.serialize_der());

    let server_config = ServerConfig::with_single_cert(vec![cert_der.clone()], priv_key.into())?;

    Ok((server_config, cert_der))
}

async fn handle_connection(incoming: Incoming, permit: OwnedSemaphorePermit, injector: Arc<Injector>) {
    match incoming.await {
        Ok(connection) => {
            info!("connection accepted: addr={}", connection.remote_address());

            let uni_task = tokio::spawn(listen_uni_streams(connection.clone(), injector));
            let close_task = tokio::spawn(async move {
                match connection.closed().await {
                    quinn::ConnectionError::ApplicationClosed { .. } => {
                        info!("connection closed by peer");
                    }
                    quinn::ConnectionError::LocallyClosed => {
                        info!("connection closed locally");
                    }
                    err => {
                        warn!("connection closed with error: {err}");
                    }
                }
            });

            if let Err(err) = uni_task.await {
                error!("uni stream task failed: {err}");
            }

            if let Err(err) = close_task.await {
                error!("connection close task failed: {err}");
            }
        }
        Err(err) => {
            error!("failed to establish connection: {err}");
        }
    }

    drop(permit);
}

async fn listen_uni_streams(connection: quinn::Connection, injector: Arc<Injector>) {
    loop {
        match connection.accept_uni().await {
            Ok(recv) => {
                let injector = Arc::clone(&injector);
                tokio::spawn(async move {
                    handle_event_stream(recv, injector).await;
                });
            }
            Err(quinn::ConnectionError::ApplicationClosed { .. })
            | Err(quinn::ConnectionError::LocallyClosed) => {
                break;
            }
            Err(err) => {
                error!("uni stream error: {err}");
                break;
            }
        }
    }
}

async fn handle_event_stream(mut recv: quinn::RecvStream, injector: Arc<Injector>) {
    let mut decoder = FrameDecoder::new();
    let mut total = 0usize;

    loop {
        match recv.read_chunk(MAX_STREAM_DATA, true).await {
            Ok(Some(chunk)) => {
                total += chunk.bytes.len();
                for frame in decoder.push(&chunk.bytes) {
                    match frame {
                        Ok(event) => injector.apply(event),
                        Err(err) => warn!("dropping frame: {err}"),
                    }
                }
            }
            Ok(None) => {
                debug!("event stream closed after {total} bytes");
                break;
            }
            Err(err) => {
                error!("failed to read event stream: {err}");
                break;
            }
        }
    }
}
