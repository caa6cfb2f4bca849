use crate::assembly::Assembly;
use crate::config::AppConfig;
use crate::error::SynthError;
use crate::stacks::{compute, event_forwarding, pipeline};
use tracing::{debug, info};

/// Declare one compute, pipeline and forwarding stack per account × app pair,
/// in config order
pub fn synthesize(config: &AppConfig) -> Result<Assembly, SynthError> {
    let mut assembly = Assembly::new();

    for (account_label, account) in config.accounts.iter() {
        for (app_label, app) in config.apps.iter() {
            debug!(
                account = %account_label,
                app = %app_label,
                "Synthesizing stacks"
            );

            let (mut compute_stack, compute_outputs) = compute::build(account, app)?;
            let mut pipeline_stack = pipeline::build(account, app, &compute_outputs)?;
            let mut forwarding_stack = event_forwarding::build(account, app)?;

            // Tags come from the account the stacks belong to
            for stack in [&mut compute_stack, &mut pipeline_stack, &mut forwarding_stack] {
                stack.apply_tags(&account.stack_tags);
            }

            assembly.push(compute_stack)?;
            assembly.push(pipeline_stack)?;
            assembly.push(forwarding_stack)?;
        }
    }

    info!(stacks = assembly.stacks().len(), "Synthesis complete");
    Ok(assembly)
}
