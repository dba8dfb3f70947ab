//! # Masala Register Entry Point
//!
//! ## Usage
//! ```text
//! masala-register [--config <path>]
//! ```
//!
//! Without `--config`, `register.toml` is read from the platform config
//! directory if present. `MASALA_*` environment variables override the file.

use std::path::PathBuf;

use tracing::error;

use masala_register::state::RegisterConfig;

#[tokio::main]
async fn main() {
    masala_register::init_tracing();

    let config = match config_path_arg() {
        Ok(Some(path)) => match RegisterConfig::load(Some(path)) {
            Ok(config) => config,
            Err(e) => {
                error!("Invalid configuration: {}", e);
                std::process::exit(2);
            }
        },
        Ok(None) => RegisterConfig::load_or_default(None),
        Err(usage) => {
            eprintln!("{}", usage);
            std::process::exit(2);
        }
    };

    if let Err(e) = masala_register::run(config).await {
        error!("Register stopped: {}", e);
        std::process::exit(1);
    }
}

fn config_path_arg() -> Result<Option<PathBuf>, String> {
    let usage = "Usage: masala-register [--config <path>]".to_string();
    let mut args = std::env::args().skip(1);
    let mut path = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" => path = Some(PathBuf::from(args.next().ok_or(usage.clone())?)),
            _ => return Err(usage),
        }
    }

    Ok(path)
}
