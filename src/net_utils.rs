// Fonctions utilitaires réseau et helpers de saisie

use serde::Serialize;
use tokio::net::UdpSocket;
use std::net::SocketAddr;
use crate::error::{AppError, Result};

/// Longueur maximale d'une adresse IPv4 pointée (ex: "255.255.255.255")
pub const MAX_IP_LEN: usize = 15;

/// Taille maximale d'une charge utile UDP sur IPv4
pub const MAX_DATAGRAM: usize = 65_507;

/// Valeur renvoyée pour une saisie numérique invalide
pub const INVALID_NUMBER: i64 = -1;

/// Vérifie qu'une chaîne ne contient que des chiffres
pub fn validate_number(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Valide une adresse IPv4 pointée : 4 octets décimaux entre 0 et 255.
///
/// Les zéros en tête sont acceptés ("010.0.0.1"), la comparaison des adresses
/// restant une égalité exacte de chaînes.
pub fn validate_ip(ip: &str) -> bool {
    if ip.is_empty() || ip.len() > MAX_IP_LEN {
        return false;
    }
    let octets: Vec<&str> = ip.split('.').collect();
    if octets.len() != 4 {
        return false;
    }
    octets
        .iter()
        .all(|octet| validate_number(octet) && octet.parse::<u16>().map_or(false, |n| n <= 255))
}

/// Lit un entier saisi par l'utilisateur ; toute saisie non entière devient `INVALID_NUMBER`
pub fn parse_number(input: &str) -> i64 {
    input.trim().parse::<i64>().unwrap_or(INVALID_NUMBER)
}

/// Fonction générique pour envoyer n'importe quel type de message sérialisable
///
/// # Arguments
/// * `socket` - Le socket UDP à utiliser pour l'envoi
/// * `addr` - L'adresse de destination
/// * `message` - Le message à envoyer (doit implémenter Serialize)
/// * `log_prefix` - Préfixe pour les logs (ex: "[SEND]", "[CLI]")
pub async fn send_message<T: Serialize>(
    socket: &UdpSocket,
    addr: &SocketAddr,
    message: &T,
    log_prefix: &str,
) -> Result<()> {
    let serialized = serde_json::to_vec(message)?;
    if serialized.len() > MAX_DATAGRAM {
        return Err(AppError::NetworkError(format!(
            "Message of {} bytes exceeds the {} byte datagram limit",
            serialized.len(),
            MAX_DATAGRAM
        )));
    }

    socket
        .send_to(&serialized, addr)
        .await
        .map_err(|e| AppError::NetworkError(format!("Failed to send message: {}", e)))?;

    log::debug!("{} Message sent to {}", log_prefix, addr);
    Ok(())
}
