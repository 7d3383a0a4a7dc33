// Protocole du service de routage

pub mod message_types;
