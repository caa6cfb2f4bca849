use anyhow::Result;
use ghost_infra::AppConfig;
use std::path::Path;

/// Load and validate the config, then make sure every stack synthesizes
pub fn handle_check_config(path: &Path) -> Result<()> {
    println!("Checking configuration {}...", path.display());

    let config = match AppConfig::load(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    match ghost_infra::synthesize(&config) {
        Ok(assembly) => {
            println!(
                "✓ Configuration is valid ({} account(s), {} app(s), {} stack(s))",
                config.accounts.len(),
                config.apps.len(),
                assembly.stacks().len()
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Synthesis error: {}", e);
            std::process::exit(1);
        }
    }
}
