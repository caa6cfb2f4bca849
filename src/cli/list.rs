use anyhow::{Context, Result};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Attribute, Cell, Table};
use ghost_infra::AppConfig;

pub fn handle_list(config: &AppConfig) -> Result<()> {
    let assembly = ghost_infra::synthesize(config).context("Failed to synthesize stacks")?;

    if assembly.stacks().is_empty() {
        println!("No stacks found.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("STACK").add_attribute(Attribute::Bold),
            Cell::new("ACCOUNT").add_attribute(Attribute::Bold),
            Cell::new("REGION").add_attribute(Attribute::Bold),
            Cell::new("RESOURCES").add_attribute(Attribute::Bold),
            Cell::new("DEPENDS ON").add_attribute(Attribute::Bold),
        ]);

    for stack in assembly.stacks() {
        let dependencies = if stack.dependencies().is_empty() {
            "-".to_string()
        } else {
            stack.dependencies().join(", ")
        };

        table.add_row(vec![
            Cell::new(stack.name()),
            Cell::new(&stack.environment().account),
            Cell::new(&stack.environment().region),
            Cell::new(stack.template().resources.len()),
            Cell::new(&dependencies),
        ]);
    }

    println!("{}", table);
    Ok(())
}
