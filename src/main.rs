use std::env;

use forecast::api::CliError;

#[tokio::main]
async fn main() {
    env_logger::init();

    let raw_args: Vec<String> = env::args().collect();
    if raw_args.get(1).map(|s| s.as_str()) == Some("serve") {
        let port = raw_args
            .get(2)
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(8080);
        if let Err(e) = forecast::api::run_http_server(port).await {
            log::error!("server error: {e}");
            std::process::exit(1);
        }
        return;
    }

    match forecast::api::run_cli(raw_args) {
        Ok(json) => println!("{json}"),
        Err(CliError::Args(e)) => e.exit(),
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Usage: forecast serve [port] | forecast [--help]");
            std::process::exit(1);
        }
    }
}
