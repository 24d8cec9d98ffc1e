//! Ephemeral UDP port allocation.

use std::io;
use std::net::{IpAddr, SocketAddr};

use tokio::net::UdpSocket;

/// Ask the OS for a free UDP port on `host`.
///
/// The probe socket is closed before returning; the port is rebound later by
/// the relay once the worker is up. Another process could grab the port in
/// between. That window is short and the race is accepted.
pub async fn allocate_port(host: IpAddr) -> io::Result<u16> {
    let socket = UdpSocket::bind(SocketAddr::new(host, 0)).await?;
    let port = socket.local_addr()?.port();
    Ok(port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn test_allocate_port_nonzero() {
        let port = allocate_port(IpAddr::V4(Ipv4Addr::LOCALHOST)).await.unwrap();
        assert_ne!(port, 0);
    }

    #[tokio::test]
    async fn test_allocated_port_is_released() {
        let host = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let port = allocate_port(host).await.unwrap();

        let socket = UdpSocket::bind(SocketAddr::new(host, port)).await.unwrap();
        assert_eq!(socket.local_addr().unwrap().port(), port);
    }
}
