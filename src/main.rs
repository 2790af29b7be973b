use clap::{CommandFactory, Parser};
use ssl_expiry_alert::cli::{exit_code, render_text, Args};
use ssl_expiry_alert::Checker;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Logs go to stderr so stdout only carries the result; RUST_LOG picks the level
    let log_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse::<Level>().ok())
        .unwrap_or(Level::WARN);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let result = match args.to_raw_config() {
        Ok(raw) => Checker::new().check_raw(&raw).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(report) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", render_text(&report));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            if err.is_input_error() {
                eprintln!("{}", Args::command().render_help());
            }
            eprintln!("Error: {}", err);
            Ok(ExitCode::from(exit_code(&err)))
        }
    }
}
