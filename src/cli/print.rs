use anyhow::{Context, Result};
use clap::ValueEnum;
use ghost_infra::AppConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

/// Print one stack's template to stdout
pub fn handle_print(config: &AppConfig, stack_name: &str, format: OutputFormat) -> Result<()> {
    let assembly = ghost_infra::synthesize(config).context("Failed to synthesize stacks")?;
    let stack = assembly.stack(stack_name)?;

    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(stack.template())
            .context("Failed to render template as JSON")?,
        OutputFormat::Yaml => {
            serde_yaml::to_string(stack.template()).context("Failed to render template as YAML")?
        }
    };

    println!("{}", rendered);
    Ok(())
}
