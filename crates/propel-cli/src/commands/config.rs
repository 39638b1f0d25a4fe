//! Config command implementations

use anyhow::{Context, Result};

use crate::output::{print_info, print_warning};
use crate::session::Session;

/// Show the config file and the effective settings
pub fn config_show(session: &Session) -> Result<()> {
    let path = &session.config_path;

    if path.exists() {
        print_info(&format!("Configuration file: {:?}", path));
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        println!("{}", content);
    } else {
        print_warning(&format!("No configuration file found at {:?}", path));
    }

    print_info("Effective configuration:");
    println!(
        "{}",
        toml::to_string_pretty(&session.config).context("Failed to render configuration")?
    );
    Ok(())
}

pub fn config_path(session: &Session) {
    println!("{}", session.config_path.display());
}
