use std::io::{self, Write};
use std::net::SocketAddr;
use routing_simulation::client::ProtocolClient;
use routing_simulation::net_utils::parse_number;
use routing_simulation::protocol::message_types::{Request, Response};

fn help() {
    println!("Commandes disponibles:");
    println!("  query <source> <destination> - Demande une route entre deux adresses");
    println!("  direct           - Accepte le lien direct proposé");
    println!("  manual           - Refuse le lien direct et construit le chemin à la main");
    println!("  hop <n>          - Propose le routeur suivant (0 pour finaliser)");
    println!("  abandon          - Abandonne la session en cours");
    println!("  topology         - Affiche la matrice d'adjacence");
    println!("  history          - Affiche l'historique des routes");
    println!("  exit             - Quitte le CLI");
}

fn read_line(prompt: &str) -> io::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Traduit une ligne de commande en requête ; `session` est la session en cours
fn parse_command(line: &str, session: Option<u64>) -> Result<Request, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let need_session = || session.ok_or_else(|| "Aucune session en cours, utilisez 'query' d'abord".to_string());
    match parts.as_slice() {
        ["query", source, destination] => Ok(Request::Query {
            source: source.to_string(),
            destination: destination.to_string(),
        }),
        ["direct"] => Ok(Request::ChooseDirect { session: need_session()? }),
        ["manual"] => Ok(Request::ChooseManual { session: need_session()? }),
        ["hop", hop] => Ok(Request::ProposeHop {
            session: need_session()?,
            hop: parse_number(hop),
        }),
        ["abandon"] => Ok(Request::Abandon { session: need_session()? }),
        ["topology"] => Ok(Request::Topology),
        ["history"] => Ok(Request::History),
        _ => Err(format!("Commande inconnue: {}", line)),
    }
}

/// Affiche la réponse et renvoie la session encore active
fn show(response: &Response, session: Option<u64>) -> Option<u64> {
    match response {
        Response::Resolved { resolution, legacy } => {
            println!(
                "Route {} ({:?}): {} [IDs: {}]",
                resolution.key, resolution.cache, resolution.path, legacy
            );
            None
        }
        Response::OfferDirect { session, source_router, destination_router } => {
            println!(
                "Lien direct entre {} et {}. Tapez 'direct' ou 'manual'.",
                source_router, destination_router
            );
            Some(*session)
        }
        Response::AwaitingHop { session, current, destination, path_so_far, destination_reachable } => {
            let path: Vec<String> = path_so_far.iter().map(|r| r.to_string()).collect();
            println!("Chemin: {} (destination {})", path.join(" --> "), destination);
            if *destination_reachable {
                println!("{} est directement relié à {}. 'hop 0' pour finaliser.", current, destination);
            }
            Some(*session)
        }
        Response::Rejected { session: rejected, code, message } => {
            println!("Refusé [{}]: {}", code, message);
            (*rejected).or(session)
        }
        Response::Abandoned { session, reason } => {
            println!("Session {} abandonnée: {}", session, reason);
            None
        }
        Response::Topology { rendered, .. } => {
            println!("{}", rendered);
            session
        }
        Response::History { entries, capacity } => {
            println!("Historique ({}/{}):", entries.len(), capacity);
            for entry in entries {
                println!("  {} : {} [IDs: {}]", entry.key, entry.path, entry.legacy);
            }
            session
        }
        Response::Error { message } => {
            println!("Erreur: {}", message);
            session
        }
    }
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let ip = read_line("Entrez l'adresse IP du serveur [127.0.0.1]: ")?;
    let ip = if ip.is_empty() { "127.0.0.1".to_string() } else { ip };
    let port: u16 = read_line("Entrez le port du serveur [5000]: ")?.parse().unwrap_or(5000);

    let server_addr: SocketAddr = match format!("{}:{}", ip, port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("Adresse invalide: {}", e);
            return Ok(());
        }
    };

    let client = match ProtocolClient::new(server_addr).await {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Impossible d'ouvrir le socket: {}", e);
            return Ok(());
        }
    };
    println!("Connexion au serveur {}...", client.server_addr());
    println!("\nBienvenue dans le CLI de routage");
    help();

    let mut session: Option<u64> = None;
    loop {
        let command = read_line("\n> ")?;
        match command.as_str() {
            "" => continue,
            "exit" => {
                println!("Au revoir!");
                break;
            }
            "help" => {
                help();
                continue;
            }
            _ => {}
        }

        let request = match parse_command(&command, session) {
            Ok(request) => request,
            Err(msg) => {
                println!("{}", msg);
                continue;
            }
        };

        match client.send(&request).await {
            Ok(response) => session = show(&response, session),
            Err(e) => println!("Erreur d'envoi: {}", e),
        }
    }
    Ok(())
}
