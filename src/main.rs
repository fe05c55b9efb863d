use std::process::ExitCode;

use anyhow::Result;
use log::*;

use engine::{Config, Engine, DEFAULT_CONFIG_PATH};

fn run() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = Config::load(&config_path)?;
    info!(
        "Loaded {} config keys from {}.",
        config.recognized_keys(),
        config_path
    );

    Engine::new(&config)?.run()
}

fn main() -> ExitCode {
    pretty_env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("[Error] {:#}", err);
            ExitCode::FAILURE
        }
    }
}
