//! The on-demand request pipeline.
//!
//! resolve -> allocate port -> start worker (readiness probe) -> bind -> relay.
//! Each step starts only after the previous one finished. The worker guard is
//! created before the listener is bound, so any later failure tears the worker
//! down again.

use std::net::{IpAddr, SocketAddr};

use tokio::net::UdpSocket;
use tracing::{info, warn};
use u7d_common::{Error, RequestIdentity, Result};

use super::port::allocate_port;
use super::relay::DatagramRelay;
use crate::server::AppContext;
use crate::worker::WorkerRequest;

/// Resolve `identity`, start its worker and bind the relay listener.
///
/// Returns a relay ready to be turned into a response body.
pub async fn open_program_stream(
    ctx: &AppContext,
    identity: &RequestIdentity,
    client_ip: &str,
) -> Result<DatagramRelay> {
    let program = ctx.catalog.resolve(identity).await?;

    let relay_host: IpAddr = ctx
        .config
        .relay
        .host
        .parse()
        .map_err(|e| Error::Config(format!("relay host {:?}: {e}", ctx.config.relay.host)))?;

    let client_port = allocate_port(relay_host).await.map_err(Error::relay)?;

    let request = WorkerRequest {
        channel_id: program.channel_id.clone(),
        program_id: program.program_id.clone(),
        offset: program.offset.clone(),
        client_port,
        client_ip: client_ip.to_string(),
    };

    let worker = ctx.supervisor.start(&request).await?;

    let socket = UdpSocket::bind(SocketAddr::new(relay_host, client_port))
        .await
        .map_err(|e| {
            warn!("Failed to bind {}:{} for {}: {}", relay_host, client_port, identity, e);
            Error::relay(e)
        })?;

    info!(
        "Stream: {} => @{}:{} [{}]",
        identity, relay_host, client_port, client_ip
    );

    let session = ctx.sessions.register_session(
        client_ip.to_string(),
        identity,
        &program,
        client_port,
        worker.id(),
    );

    Ok(DatagramRelay::new(socket, worker, ctx.sessions.shutdown_token()).with_session(session))
}
