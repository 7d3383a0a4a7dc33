// Service réseau exposant le résolveur de routes

pub mod protocol_server;
pub mod response_handler;

pub use protocol_server::ProtocolServer;
