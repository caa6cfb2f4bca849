//! Physical names derived from configuration.
//!
//! CloudFormation replaces a resource whenever its name changes, so every
//! name here is part of the deployment contract. Changing a format string
//! recreates (or orphans) the resource in every account.

use crate::config::{AccountConfig, FrontendAppConfig};

/// Compute/network stack: cluster reference, Fargate service, load balancer
pub fn compute_stack_name(account: &AccountConfig) -> String {
    format!(
        "cdk-fe-ghost-app-infra-pipeline-{}-{}",
        account.project.short_name, account.account_id
    )
}

/// Build/deploy pipeline stack
pub fn pipeline_stack_name(account: &AccountConfig) -> String {
    format!(
        "cdk-ghost-app-deployment-pipeline-{}-{}",
        account.project.short_name, account.account_id
    )
}

/// Event-forwarding stack, deployed to the service account
pub fn event_forwarding_stack_name(account: &AccountConfig, app: &FrontendAppConfig) -> String {
    format!(
        "cdk-event-rule-{}-infra-{}-{}",
        app.code.name, account.project.short_name, account.service_account.account_id
    )
}

/// Export carrying the Fargate service name from the compute stack
pub fn service_name_export(compute_stack_name: &str) -> String {
    format!("{}-ecs-service-name", compute_stack_name)
}

pub fn artifacts_bucket_name(account: &AccountConfig) -> String {
    format!(
        "{}.fr-artifacts.{}.{}.{}.s3",
        account.env, account.account_id, account.project.short_name, account.project.client
    )
}

/// SSM parameter holding the KMS key ARN of the cross-account artifact bucket
pub fn artifacts_key_parameter(account: &AccountConfig) -> String {
    format!(
        "{}.crossaccount-artifacts-backet-key-{}.{}.secret",
        account.env, account.account_id, account.project.short_name
    )
}

/// SSM parameter holding the name of the cross-account artifact bucket
pub fn artifacts_bucket_parameter(account: &AccountConfig) -> String {
    format!(
        "{}.crossaccount-artifacts-backet-name-{}.{}.name",
        account.env, account.account_id, account.project.short_name
    )
}

pub fn codecommit_repository_arn(account: &AccountConfig, app: &FrontendAppConfig) -> String {
    format!(
        "arn:aws:codecommit:{}:{}:{}",
        account.region, account.service_account.account_id, app.code.source_repo
    )
}

/// Default event bus of the hosting account
pub fn hosting_event_bus_arn(account: &AccountConfig) -> String {
    format!(
        "arn:aws:events:{}:{}:event-bus/default",
        account.region, account.account_id
    )
}

pub fn ecs_task_execution_role_arn(account: &AccountConfig) -> String {
    format!("arn:aws:iam::{}:role/ecsTaskExecutionRole", account.account_id)
}
