//! Subnet selection and security groups shared by the compute and pipeline stacks.

use super::Stack;
use crate::config::{AccountConfig, FrontendAppConfig};
use crate::error::SynthError;
use crate::template::Resource;
use serde_json::json;
use tracing::debug;

/// Subnets of the account's VPC that lie in the app's availability zones,
/// in configuration order
pub fn select_subnets(
    account: &AccountConfig,
    app: &FrontendAppConfig,
) -> Result<Vec<String>, SynthError> {
    let zones = app.ecs.zones_for(&account.region);
    let selected: Vec<String> = account
        .resources
        .subnets
        .iter()
        .filter(|subnet| zones.contains(&subnet.availability_zone))
        .map(|subnet| subnet.id.clone())
        .collect();

    if selected.is_empty() {
        return Err(SynthError::NoSubnetsInZones {
            vpc_id: account.resources.vpc_id.clone(),
            zones,
        });
    }

    debug!(
        vpc_id = %account.resources.vpc_id,
        subnets = ?selected,
        "Selected subnets"
    );
    Ok(selected)
}

/// Like [`select_subnets`] but keeps only the first subnet of each zone.
/// Interface endpoints accept at most one subnet per availability zone.
pub fn select_subnets_one_per_zone(
    account: &AccountConfig,
    app: &FrontendAppConfig,
) -> Result<Vec<String>, SynthError> {
    let selected = select_subnets(account, app)?;
    let mut seen_zones: Vec<&str> = Vec::new();
    let mut result = Vec::new();

    for subnet in &account.resources.subnets {
        if !selected.contains(&subnet.id) || seen_zones.contains(&subnet.availability_zone.as_str())
        {
            continue;
        }
        seen_zones.push(&subnet.availability_zone);
        result.push(subnet.id.clone());
    }

    Ok(result)
}

fn allow_all_outbound() -> serde_json::Value {
    json!([{
        "CidrIp": "0.0.0.0/0",
        "Description": "Allow all outbound traffic by default",
        "IpProtocol": "-1",
    }])
}

/// Security group admitting TCP on the container port from anywhere
pub fn container_security_group(
    stack: &mut Stack,
    id: &str,
    account: &AccountConfig,
    app: &FrontendAppConfig,
) -> Result<String, SynthError> {
    let port = app.ecs.container_port;
    let resource = Resource::new(
        "AWS::EC2::SecurityGroup",
        json!({
            "GroupDescription": format!("{}/{}", stack.name(), id),
            "VpcId": account.resources.vpc_id,
            "SecurityGroupEgress": allow_all_outbound(),
            "SecurityGroupIngress": [{
                "CidrIp": "0.0.0.0/0",
                "Description": format!("SG for {} container in ECS", app.code.name),
                "FromPort": port,
                "ToPort": port,
                "IpProtocol": "tcp",
            }],
        }),
    );
    stack.add(&[id], resource)
}

/// Security group with no ingress and all outbound traffic allowed
pub fn egress_only_security_group(
    stack: &mut Stack,
    path: &[&str],
    account: &AccountConfig,
) -> Result<String, SynthError> {
    let resource = Resource::new(
        "AWS::EC2::SecurityGroup",
        json!({
            "GroupDescription": format!("{}/{}", stack.name(), path.join("/")),
            "VpcId": account.resources.vpc_id,
            "SecurityGroupEgress": allow_all_outbound(),
        }),
    );
    stack.add(path, resource)
}
