// Boucle UDP du service : un datagramme JSON par requête et par réponse

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use log::{debug, error, info};
use crate::error::Result;
use crate::net_utils::{send_message, MAX_DATAGRAM};
use crate::protocol::message_types::{Request, Response};
use crate::server::response_handler::handle_request;
use crate::AppState;

pub struct ProtocolServer {
    socket: Arc<UdpSocket>,
    state: Arc<AppState>,
}

impl ProtocolServer {
    pub fn new(socket: Arc<UdpSocket>, state: Arc<AppState>) -> Self {
        Self { socket, state }
    }

    pub async fn bind(bind_addr: &str, state: Arc<AppState>) -> Result<Self> {
        let socket = UdpSocket::bind(bind_addr).await?;
        info!("Routing service bound to {}", socket.local_addr()?);
        Ok(Self::new(Arc::new(socket), state))
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Écoute jusqu'à une erreur de réception
    pub async fn run(&self) -> Result<()> {
        let mut buf = vec![0u8; MAX_DATAGRAM];

        loop {
            let (len, addr) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(e) => {
                    error!("Error receiving request: {}", e);
                    return Err(e.into());
                }
            };

            let payload = buf[..len].to_vec();
            let socket = Arc::clone(&self.socket);
            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                let response = match serde_json::from_slice::<Request>(&payload) {
                    Ok(request) => {
                        debug!("Received {:?} from {}", request, addr);
                        handle_request(&state, request, addr).await
                    }
                    Err(e) => {
                        error!("Failed to parse request from {}: {}", addr, e);
                        Response::Error {
                            message: format!("Malformed request: {}", e),
                        }
                    }
                };
                if let Err(e) = send_message(&socket, &addr, &response, "[SEND] RESPONSE").await {
                    error!("Failed to answer {}: {}", addr, e);
                    let fallback = Response::Error { message: e.to_string() };
                    if let Err(e) = send_message(&socket, &addr, &fallback, "[SEND] ERROR").await {
                        error!("Failed to report error to {}: {}", addr, e);
                    }
                }
            });
        }
    }
}
