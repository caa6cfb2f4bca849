pub mod compute;
pub mod event_forwarding;
pub mod events;
pub mod network;
pub mod pipeline;

pub use compute::ComputeStackOutputs;

use crate::error::SynthError;
use crate::iam::{policy_resource, PolicyStatement, ServiceRole};
use crate::template::{apply_tags, logical_id, Output, Parameter, Resource, Template};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Target account and region of a stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub account: String,
    pub region: String,
}

impl Environment {
    pub fn new(account: &str, region: &str) -> Self {
        Self {
            account: account.to_string(),
            region: region.to_string(),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "aws://{}/{}", self.account, self.region)
    }
}

/// One CloudFormation template with the account and region it deploys to
/// and the stacks it must be deployed after
#[derive(Debug, Clone)]
pub struct Stack {
    name: String,
    environment: Environment,
    template: Template,
    dependencies: Vec<String>,
}

impl Stack {
    pub fn new(name: &str, environment: Environment, description: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            environment,
            template: Template::new(description),
            dependencies: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Names of stacks that must be deployed before this one
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Declare a resource at a construct path and return its logical ID
    pub fn add(&mut self, path: &[&str], resource: Resource) -> Result<String, SynthError> {
        let id = logical_id(path);
        debug!(
            stack = %self.name,
            logical_id = %id,
            resource_type = %resource.resource_type,
            "Declaring resource"
        );
        self.template.insert_resource(&self.name, id.clone(), resource)?;
        Ok(id)
    }

    /// Declare a service role and its default policy.
    ///
    /// Resources assuming the role should be passed through [`RoleIds::gate`]
    /// so they are created after the policy is attached.
    pub fn add_role(
        &mut self,
        path: &[&str],
        role: ServiceRole,
    ) -> Result<RoleIds, SynthError> {
        let role_id = logical_id(path);
        let mut policy_path = path.to_vec();
        policy_path.push("DefaultPolicy");
        let policy_id = logical_id(&policy_path);

        let (role_resource, default_policy) = role.into_resources(&role_id, &policy_id);
        self.add(path, role_resource)?;
        let policy = match default_policy {
            Some(resource) => Some(self.add(&policy_path, resource)?),
            None => None,
        };

        Ok(RoleIds {
            role: role_id,
            policy,
        })
    }

    /// Declare a standalone policy attached to an already declared role.
    ///
    /// Unlike the role's default policy, it can be listed in `DependsOn` of
    /// resources that the default policy itself refers to.
    pub fn add_policy(
        &mut self,
        path: &[&str],
        role_logical_id: &str,
        statements: Vec<PolicyStatement>,
    ) -> Result<String, SynthError> {
        if statements.is_empty() {
            return Err(SynthError::EmptyActions);
        }
        let id = logical_id(path);
        self.add(path, policy_resource(&id, role_logical_id, &statements))
    }

    /// Declare a template parameter and return its logical ID
    pub fn add_parameter(&mut self, path: &[&str], parameter: Parameter) -> Result<String, SynthError> {
        let id = logical_id(path);
        if self.template.parameters.contains_key(&id) || self.template.resources.contains_key(&id) {
            return Err(SynthError::DuplicateLogicalId {
                stack: self.name.clone(),
                logical_id: id,
            });
        }
        self.template.parameters.insert(id.clone(), parameter);
        Ok(id)
    }

    /// Declare an output. Output keys keep the readable id without a hash suffix.
    pub fn add_output(&mut self, id: &str, output: Output) -> Result<String, SynthError> {
        let key: String = id.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        if self.template.outputs.contains_key(&key) {
            return Err(SynthError::DuplicateLogicalId {
                stack: self.name.clone(),
                logical_id: key,
            });
        }
        self.template.outputs.insert(key.clone(), output);
        Ok(key)
    }

    pub fn add_dependency(&mut self, stack_name: &str) {
        if !self.dependencies.iter().any(|d| d == stack_name) {
            self.dependencies.push(stack_name.to_string());
        }
    }

    pub fn apply_tags(&mut self, tags: &BTreeMap<String, String>) {
        apply_tags(&mut self.template, tags);
    }
}

/// Logical IDs of a declared service role and its default policy
#[derive(Debug, Clone)]
pub struct RoleIds {
    pub role: String,
    pub policy: Option<String>,
}

impl RoleIds {
    /// Make `resource` wait for the role's permissions
    pub fn gate(&self, resource: Resource) -> Resource {
        let resource = resource.depends_on(&self.role);
        match &self.policy {
            Some(policy) => resource.depends_on(policy),
            None => resource,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stack() -> Stack {
        Stack::new("test-stack", Environment::new("111111111111", "eu-central-1"), None)
    }

    #[test]
    fn test_environment_display() {
        assert_eq!(
            Environment::new("111111111111", "eu-central-1").to_string(),
            "aws://111111111111/eu-central-1"
        );
    }

    #[test]
    fn test_add_returns_stable_logical_id() {
        let mut stack = stack();
        let id = stack
            .add(&["ecr"], Resource::new("AWS::ECR::Repository", json!({})))
            .unwrap();
        assert_eq!(id, logical_id(&["ecr"]));
        assert!(stack.template().resources.contains_key(&id));
    }

    #[test]
    fn test_parameter_and_resource_ids_conflict() {
        let mut stack = stack();
        stack
            .add(&["param"], Resource::new("AWS::S3::Bucket", json!({})))
            .unwrap();
        assert!(stack
            .add_parameter(&["param"], Parameter::ssm_string("/x"))
            .is_err());
    }

    #[test]
    fn test_role_gate_depends_on_policy() {
        let mut stack = stack();
        let mut role = ServiceRole::new("codebuild.amazonaws.com");
        role.add_to_policy(PolicyStatement::allow(&["iam:CreateRole"], vec![json!("*")]).unwrap());
        let ids = stack.add_role(&["build", "Role"], role).unwrap();

        let gated = ids.gate(Resource::new("AWS::CodeBuild::Project", json!({})));
        assert!(gated.depends_on.contains(&ids.role));
        assert!(gated.depends_on.contains(ids.policy.as_ref().unwrap()));
    }

    #[test]
    fn test_standalone_policy_attaches_to_role() {
        let mut stack = stack();
        let ids = stack
            .add_role(&["build", "Role"], ServiceRole::new("codebuild.amazonaws.com"))
            .unwrap();
        let statement = PolicyStatement::allow(&["ec2:DescribeVpcs"], vec![json!("*")]).unwrap();
        let policy = stack
            .add_policy(&["build", "PolicyDocument"], &ids.role, vec![statement])
            .unwrap();

        let resource = &stack.template().resources[&policy];
        assert_eq!(resource.resource_type, "AWS::IAM::Policy");
        assert_eq!(resource.properties["Roles"], json!([{ "Ref": ids.role }]));
        assert!(stack
            .add_policy(&["build", "Empty"], &ids.role, Vec::new())
            .is_err());
    }

    #[test]
    fn test_output_keys_are_readable() {
        let mut stack = stack();
        let key = stack
            .add_output("ecs_name", Output::new("ecs cluster arn", json!("x")))
            .unwrap();
        assert_eq!(key, "ecsname");
    }

    #[test]
    fn test_dependencies_are_unique() {
        let mut stack = stack();
        stack.add_dependency("other");
        stack.add_dependency("other");
        assert_eq!(stack.dependencies(), &["other".to_string()]);
    }
}
