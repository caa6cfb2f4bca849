//! Compute stack: the Fargate task definition, the service, and the TLS
//! network load balancer in front of it.

use super::network::{container_security_group, select_subnets};
use super::{Environment, Stack};
use crate::config::{AccountConfig, FrontendAppConfig};
use crate::error::SynthError;
use crate::names;
use crate::template::intrinsics::{get_att, reference, sub, AWS_REGION};
use crate::template::{Output, RemovalPolicy, Resource};
use serde_json::json;
use tracing::info;

const LOG_RETENTION_DAYS: u32 = 731;
const DEREGISTRATION_DELAY_SECONDS: u32 = 60;

/// Values the pipeline stack needs from the compute stack.
///
/// Only obtainable by building the compute stack, so a pipeline stack can
/// never be declared before the service it deploys to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeStackOutputs {
    pub stack_name: String,
    /// Export name carrying the Fargate service name
    pub service_name_export: String,
    pub cluster_name: String,
}

pub fn build(
    account: &AccountConfig,
    app: &FrontendAppConfig,
) -> Result<(Stack, ComputeStackOutputs), SynthError> {
    let name = names::compute_stack_name(account);
    let app_name = &app.code.name;
    info!(stack = %name, app = %app_name, "Building compute stack");

    let mut stack = Stack::new(
        &name,
        Environment::new(&account.account_id, &account.region),
        Some(format!("ECS Fargate service and load balancer for {}", app_name)),
    );
    let subnets = select_subnets(account, app)?;

    let security_group = container_security_group(&mut stack, "fssg", account, app)?;

    let log_group = stack.add(
        &["loggroup"],
        Resource::new(
            "AWS::Logs::LogGroup",
            json!({ "RetentionInDays": LOG_RETENTION_DAYS }),
        )
        .removal_policy(RemovalPolicy::Retain),
    )?;

    let container_name = format!("{}-container", app_name);
    let task_role = names::ecs_task_execution_role_arn(account);
    let task_definition = stack.add(
        &["td"],
        Resource::new(
            "AWS::ECS::TaskDefinition",
            json!({
                "Family": app_name,
                "Cpu": app.ecs.td_cpu.to_string(),
                "Memory": app.ecs.td_memory.to_string(),
                "NetworkMode": "awsvpc",
                "RequiresCompatibilities": ["FARGATE"],
                "ExecutionRoleArn": task_role,
                "TaskRoleArn": task_role,
                "ContainerDefinitions": [{
                    "Name": container_name,
                    "Image": app.ecs.image(),
                    "Essential": true,
                    "Cpu": app.ecs.container_cpu,
                    "Memory": app.ecs.container_memory,
                    "LogConfiguration": {
                        "LogDriver": "awslogs",
                        "Options": {
                            "awslogs-group": reference(&log_group),
                            "awslogs-stream-prefix": "ecs",
                            "awslogs-region": reference(AWS_REGION),
                        },
                    },
                    "PortMappings": [{
                        "ContainerPort": app.ecs.container_port,
                        "HostPort": app.ecs.host_port,
                        "Protocol": "tcp",
                    }],
                }],
            }),
        ),
    )?;

    let load_balancer = stack.add(
        &["network-load-balancer"],
        Resource::new(
            "AWS::ElasticLoadBalancingV2::LoadBalancer",
            json!({
                "Type": "network",
                "Scheme": "internal",
                "Subnets": subnets,
            }),
        ),
    )?;

    let target_group = stack.add(
        &["tlsListener", "ECS1Group"],
        Resource::new(
            "AWS::ElasticLoadBalancingV2::TargetGroup",
            json!({
                "Port": app.ecs.host_port,
                "Protocol": "TCP",
                "TargetType": "ip",
                "VpcId": account.resources.vpc_id,
                "TargetGroupAttributes": [{
                    "Key": "deregistration_delay.timeout_seconds",
                    "Value": DEREGISTRATION_DELAY_SECONDS.to_string(),
                }],
            }),
        ),
    )?;

    let listener = stack.add(
        &["tlsListener"],
        Resource::new(
            "AWS::ElasticLoadBalancingV2::Listener",
            json!({
                "LoadBalancerArn": reference(&load_balancer),
                "Port": app.lb.target_port,
                "Protocol": "TLS",
                "Certificates": [{ "CertificateArn": app.lb.certificate_arn }],
                "DefaultActions": [{
                    "Type": "forward",
                    "TargetGroupArn": reference(&target_group),
                }],
            }),
        ),
    )?;

    let service = stack.add(
        &["fs"],
        Resource::new(
            "AWS::ECS::Service",
            json!({
                "Cluster": app.ecs.cluster_name,
                "LaunchType": "FARGATE",
                "DesiredCount": 0,
                "TaskDefinition": reference(&task_definition),
                "NetworkConfiguration": {
                    "AwsvpcConfiguration": {
                        "AssignPublicIp": "ENABLED",
                        "SecurityGroups": [get_att(&security_group, "GroupId")],
                        "Subnets": subnets,
                    },
                },
                "LoadBalancers": [{
                    "ContainerName": container_name,
                    "ContainerPort": app.ecs.container_port,
                    "TargetGroupArn": reference(&target_group),
                }],
            }),
        )
        .depends_on(&listener)
        .depends_on(&target_group),
    )?;

    stack.add_output(
        "ecs_name",
        Output::new(
            "ecs cluster arn",
            sub(&format!(
                "arn:${{AWS::Partition}}:ecs:${{AWS::Region}}:${{AWS::AccountId}}:cluster/{}",
                app.ecs.cluster_name
            )),
        ),
    )?;

    let service_name_export = names::service_name_export(&name);
    stack.add_output(
        "ecs_service_name",
        Output::new("ecs service name", get_att(&service, "Name"))
            .exported_as(&service_name_export),
    )?;

    let outputs = ComputeStackOutputs {
        stack_name: name,
        service_name_export,
        cluster_name: app.ecs.cluster_name.clone(),
    };
    Ok((stack, outputs))
}
