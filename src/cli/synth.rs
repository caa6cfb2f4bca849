use anyhow::{Context, Result};
use ghost_infra::AppConfig;
use std::path::Path;

/// Synthesize every stack and write the cloud assembly to `out`
pub fn handle_synth(config: &AppConfig, out: &Path) -> Result<()> {
    let assembly = ghost_infra::synthesize(config).context("Failed to synthesize stacks")?;
    assembly
        .write(out)
        .with_context(|| format!("Failed to write cloud assembly to {}", out.display()))?;

    println!(
        "✓ Synthesized {} stack(s) to {}",
        assembly.stacks().len(),
        out.display()
    );
    Ok(())
}
