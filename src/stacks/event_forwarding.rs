//! Deployed to the service account that owns the CodeCommit repository.
//! Relays branch changes to the hosting account's default event bus.

use super::events::codecommit_branch_pattern;
use super::{Environment, Stack};
use crate::config::{AccountConfig, FrontendAppConfig};
use crate::error::SynthError;
use crate::iam::{PolicyStatement, ServiceRole};
use crate::names;
use crate::template::intrinsics::get_att;
use crate::template::Resource;
use serde_json::json;
use tracing::info;

pub fn build(account: &AccountConfig, app: &FrontendAppConfig) -> Result<Stack, SynthError> {
    let name = names::event_forwarding_stack_name(account, app);
    let service_account = &account.service_account;
    info!(
        stack = %name,
        service_account = %service_account.account_id,
        "Building event forwarding stack"
    );

    let mut stack = Stack::new(
        &name,
        Environment::new(&service_account.account_id, &service_account.region),
        Some(format!(
            "Forwards {} branch changes to account {}",
            app.code.source_repo, account.account_id
        )),
    );

    let bus_arn = names::hosting_event_bus_arn(account);

    let mut role = ServiceRole::new("events.amazonaws.com");
    role.add_to_policy(PolicyStatement::allow(
        &["events:PutEvents"],
        vec![json!(bus_arn)],
    )?);
    let role = stack.add_role(&["event-rule", "EventsRole"], role)?;

    stack.add(
        &["event-rule"],
        role.gate(Resource::new(
            "AWS::Events::Rule",
            json!({
                "Description": format!(
                    "Trigger pipeline in the account {} for the repository {}",
                    account.account_id, app.code.source_repo
                ),
                "EventPattern": codecommit_branch_pattern(account, app),
                "State": "ENABLED",
                "Targets": [{
                    "Arn": bus_arn,
                    "Id": "Target0",
                    "RoleArn": get_att(&role.role, "Arn"),
                }],
            }),
        )),
    )?;

    Ok(stack)
}
