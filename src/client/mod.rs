// Côté client du service de routage

pub mod protocol_client;

pub use protocol_client::ProtocolClient;
