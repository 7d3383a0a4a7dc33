// Client UDP du service de routage : envoie une requête, attend la réponse

use tokio::net::UdpSocket;
use tokio::time::{timeout, Duration};
use std::net::SocketAddr;
use log::debug;
use crate::error::{AppError, Result};
use crate::net_utils::{send_message, MAX_DATAGRAM};
use crate::protocol::message_types::{Request, Response};

pub struct ProtocolClient {
    socket: UdpSocket,
    server_addr: SocketAddr,
    reply_timeout: Duration,
}

impl ProtocolClient {
    pub async fn new(server_addr: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        Ok(Self {
            socket,
            server_addr,
            reply_timeout: Duration::from_secs(5),
        })
    }

    pub fn with_reply_timeout(mut self, reply_timeout: Duration) -> Self {
        self.reply_timeout = reply_timeout;
        self
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    pub async fn send(&self, request: &Request) -> Result<Response> {
        send_message(&self.socket, &self.server_addr, request, "[CLI]").await?;

        let mut buffer = vec![0u8; MAX_DATAGRAM];
        let (size, from) = timeout(self.reply_timeout, self.socket.recv_from(&mut buffer))
            .await
            .map_err(|_| AppError::NetworkError(format!("No answer from {}", self.server_addr)))??;
        debug!("[CLI] {} bytes received from {}", size, from);

        Ok(serde_json::from_slice(&buffer[..size])?)
    }
}
