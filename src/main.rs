use std::env;
use std::path::PathBuf;

use savebot::api::ServerConfig;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let raw_args: Vec<String> = env::args().collect();
    match raw_args.get(1).map(|s| s.as_str()) {
        Some("serve") => {
            let defaults = ServerConfig::default();
            let config = ServerConfig {
                port: raw_args
                    .get(2)
                    .and_then(|s| s.parse::<u16>().ok())
                    .unwrap_or(defaults.port),
                state_path: match raw_args.get(3).map(|s| s.as_str()) {
                    Some("--memory") => None,
                    Some(path) => Some(PathBuf::from(path)),
                    None => defaults.state_path.clone(),
                },
                ..defaults
            };
            if let Err(e) = savebot::api::run_http_server(config).await {
                eprintln!("Server error: {e}");
                std::process::exit(1);
            }
        }
        Some("simulate") => {
            let args = std::iter::once("savebot".to_string()).chain(raw_args.into_iter().skip(2));
            match savebot::api::run_cli(args) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("{e}");
                    std::process::exit(2);
                }
            }
        }
        _ => {
            eprintln!("Usage: savebot serve [port] [state-file|--memory]");
            eprintln!(
                "       savebot simulate [--amount N] [--years N] [--risk-profile P] \
                 [--strategy S] [--seed N] [--company C]"
            );
            std::process::exit(1);
        }
    }
}
