use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gator::app::{AppContext, GatorError};
use gator::cli::{commands, Cli};
use gator::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "gator=info".into()))
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(Config::default_config_path);
    let config = Config::load(&config_path)?;
    let loaded = config.clone();

    let mut ctx = AppContext::new(config)?;
    let registry = commands::registry();

    match registry.run(&mut ctx, &cli.to_command()).await {
        Ok(()) => {
            if ctx.config != loaded {
                ctx.config.save(&config_path)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_fatal() => {
            eprintln!("{}", e);
            Ok(ExitCode::FAILURE)
        }
        Err(e) => {
            eprintln!("Error: {}", error_chain(&e));
            Ok(ExitCode::FAILURE)
        }
    }
}

fn error_chain(err: &GatorError) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
