use std::env;
use std::error::Error as StdError;
use std::path::PathBuf;
use std::sync::Arc;
use log::{info, warn};
use routing_simulation::error::AppError;
use routing_simulation::init::{init_logging_and_env, init_socket, init_state};
use routing_simulation::read_config::{read_config_file, read_network_config, NetworkConfig};
use routing_simulation::server::ProtocolServer;
use routing_simulation::tasks::spawn_session_timeout_task;
use routing_simulation::console;

#[derive(Debug, Default)]
struct Options {
    config: Option<PathBuf>,
    serve: bool,
    auto: Option<u64>,
}

fn usage(program: &str) -> String {
    format!("Usage: {} [--config <file.toml>] [--serve | --auto [seed]]", program)
}

fn parse_args(args: &[String]) -> Result<Options, AppError> {
    let program = args.first().map(String::as_str).unwrap_or("routing");
    let mut options = Options::default();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                let path = args.get(i + 1).ok_or_else(|| AppError::ConfigError(usage(program)))?;
                options.config = Some(PathBuf::from(path));
                i += 1;
            }
            "--serve" => options.serve = true,
            "--auto" => {
                let seed = match args.get(i + 1).and_then(|s| s.parse::<u64>().ok()) {
                    Some(seed) => {
                        i += 1;
                        seed
                    }
                    None => rand::random(),
                };
                options.auto = Some(seed);
            }
            other => {
                return Err(AppError::ConfigError(format!("Unknown argument {}. {}", other, usage(program))));
            }
        }
        i += 1;
    }
    if options.serve && options.auto.is_some() {
        return Err(AppError::ConfigError(usage(program)));
    }
    Ok(options)
}

async fn serve(config: NetworkConfig) -> Result<(), AppError> {
    if !config.has_networks() {
        return Err(AppError::ConfigError(
            "The routing service needs router networks in its configuration".to_string(),
        ));
    }
    let state = init_state(&config)?;
    let socket = init_socket(config.port).await?;
    info!("Routing service listening on port {}", config.port);

    let _expiry = spawn_session_timeout_task(Arc::clone(&state));
    ProtocolServer::new(socket, state).run().await
}

/// Point d'entrée principal du programme
#[tokio::main]
async fn main() -> Result<(), Box<dyn StdError>> {
    init_logging_and_env();

    let args: Vec<String> = env::args().collect();
    let options = parse_args(&args)?;

    let config = match &options.config {
        Some(path) => read_config_file(path)?,
        None => read_network_config().unwrap_or_else(|e| {
            warn!("{}; using the reference topology", e);
            NetworkConfig::reference()
        }),
    };

    if options.serve {
        serve(config).await?;
    } else {
        let auto = options.auto;
        if let Some(seed) = auto {
            info!("Random hop selection, seed {}", seed);
        }
        tokio::task::spawn_blocking(move || console::run_simulation(config, auto)).await??;
    }
    Ok(())
}
