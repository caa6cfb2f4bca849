//! IAM policy statements, documents, and service roles.
//!
//! A statement must name at least one action and one resource.

use crate::error::SynthError;
use crate::template::intrinsics::reference;
use crate::template::Resource;
use serde_json::{json, Value};

pub const POLICY_VERSION: &str = "2012-10-17";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    fn as_str(self) -> &'static str {
        match self {
            Effect::Allow => "Allow",
            Effect::Deny => "Deny",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolicyStatement {
    pub effect: Effect,
    pub actions: Vec<String>,
    pub resources: Vec<Value>,
    pub condition: Option<Value>,
}

impl PolicyStatement {
    pub fn new(effect: Effect, actions: &[&str], resources: Vec<Value>) -> Result<Self, SynthError> {
        if actions.is_empty() {
            return Err(SynthError::EmptyActions);
        }
        if resources.is_empty() {
            return Err(SynthError::EmptyResources(actions.join(", ")));
        }
        Ok(Self {
            effect,
            actions: actions.iter().map(|a| a.to_string()).collect(),
            resources,
            condition: None,
        })
    }

    pub fn allow(actions: &[&str], resources: Vec<Value>) -> Result<Self, SynthError> {
        Self::new(Effect::Allow, actions, resources)
    }

    pub fn with_condition(mut self, condition: Value) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn to_json(&self) -> Value {
        let mut statement = json!({
            "Effect": self.effect.as_str(),
            "Action": collapse(self.actions.iter().map(|a| json!(a)).collect()),
            "Resource": collapse(self.resources.clone()),
        });
        if let Some(condition) = &self.condition {
            statement["Condition"] = condition.clone();
        }
        statement
    }
}

/// Single-element lists are written as a scalar, the way IAM itself echoes them
fn collapse(mut values: Vec<Value>) -> Value {
    if values.len() == 1 {
        values.remove(0)
    } else {
        Value::Array(values)
    }
}

pub fn policy_document(statements: &[PolicyStatement]) -> Value {
    json!({
        "Version": POLICY_VERSION,
        "Statement": statements.iter().map(PolicyStatement::to_json).collect::<Vec<_>>(),
    })
}

/// Trust policy letting an AWS service assume a role
pub fn assume_role_policy(service_principal: &str) -> Value {
    json!({
        "Version": POLICY_VERSION,
        "Statement": [{
            "Effect": "Allow",
            "Principal": { "Service": service_principal },
            "Action": "sts:AssumeRole",
        }],
    })
}

/// ECR actions needed to pull from and push to a repository
pub fn grant_pull_push(repository_arn: Value) -> Result<Vec<PolicyStatement>, SynthError> {
    Ok(vec![
        PolicyStatement::allow(
            &[
                "ecr:BatchCheckLayerAvailability",
                "ecr:GetDownloadUrlForLayer",
                "ecr:BatchGetImage",
                "ecr:CompleteLayerUpload",
                "ecr:UploadLayerPart",
                "ecr:InitiateLayerUpload",
                "ecr:PutImage",
            ],
            vec![repository_arn],
        )?,
        PolicyStatement::allow(&["ecr:GetAuthorizationToken"], vec![json!("*")])?,
    ])
}

/// ECR actions needed to pull from a repository
pub fn grant_pull(repository_arn: Value) -> Result<PolicyStatement, SynthError> {
    PolicyStatement::allow(
        &[
            "ecr:BatchCheckLayerAvailability",
            "ecr:GetDownloadUrlForLayer",
            "ecr:BatchGetImage",
        ],
        vec![repository_arn],
    )
}

/// S3 read/write on a bucket and every object in it
pub fn grant_read_write(bucket_arn: Value) -> Result<PolicyStatement, SynthError> {
    let objects = json!({ "Fn::Join": ["", [bucket_arn.clone(), "/*"]] });
    PolicyStatement::allow(
        &[
            "s3:GetObject*",
            "s3:GetBucket*",
            "s3:List*",
            "s3:DeleteObject*",
            "s3:PutObject",
            "s3:PutObjectLegalHold",
            "s3:PutObjectRetention",
            "s3:PutObjectTagging",
            "s3:PutObjectVersionTagging",
            "s3:Abort*",
        ],
        vec![bucket_arn, objects],
    )
}

/// KMS actions needed to read and write artifacts encrypted with a key
pub fn grant_encrypt_decrypt(key_arn: Value) -> Result<PolicyStatement, SynthError> {
    PolicyStatement::allow(
        &[
            "kms:Decrypt",
            "kms:DescribeKey",
            "kms:Encrypt",
            "kms:ReEncrypt*",
            "kms:GenerateDataKey*",
        ],
        vec![key_arn],
    )
}

/// An `AWS::IAM::Policy` attached to one role
pub fn policy_resource(
    policy_name: &str,
    role_logical_id: &str,
    statements: &[PolicyStatement],
) -> Resource {
    Resource::new(
        "AWS::IAM::Policy",
        json!({
            "PolicyDocument": policy_document(statements),
            "PolicyName": policy_name,
            "Roles": [reference(role_logical_id)],
        }),
    )
}

/// A role assumed by one AWS service, with an inline default policy
#[derive(Debug, Clone)]
pub struct ServiceRole {
    service_principal: String,
    statements: Vec<PolicyStatement>,
}

impl ServiceRole {
    pub fn new(service_principal: &str) -> Self {
        Self {
            service_principal: service_principal.to_string(),
            statements: Vec::new(),
        }
    }

    pub fn add_to_policy(&mut self, statement: PolicyStatement) -> &mut Self {
        self.statements.push(statement);
        self
    }

    pub fn add_all(&mut self, statements: impl IntoIterator<Item = PolicyStatement>) -> &mut Self {
        self.statements.extend(statements);
        self
    }

    /// The role resource, plus an `AWS::IAM::Policy` when statements were added
    pub fn into_resources(
        self,
        role_logical_id: &str,
        policy_name: &str,
    ) -> (Resource, Option<Resource>) {
        let role = Resource::new(
            "AWS::IAM::Role",
            json!({ "AssumeRolePolicyDocument": assume_role_policy(&self.service_principal) }),
        );

        let policy = if self.statements.is_empty() {
            None
        } else {
            Some(policy_resource(
                policy_name,
                role_logical_id,
                &self.statements,
            ))
        };

        (role, policy)
    }
}
