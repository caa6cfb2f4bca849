//! Deployment configuration (config.yaml).
//!
//! The file carries two top-level maps: `aws_vars` (one entry per hosting
//! account) and `frontend-ghost-app` (one entry per front-end application).
//! Every stack is instantiated once per account × app pair, in file order.

mod validation;

use crate::error::ConfigError;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::Path;
use tracing::{debug, info, warn};

/// Default image for the task definition until the pipeline deploys a real one
pub const DEFAULT_CONTAINER_IMAGE: &str = "amazon/amazon-ecs-sample";

lazy_static::lazy_static! {
    static ref ENV_VAR_PATTERN: regex::Regex =
        regex::Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").expect("valid env var pattern");
}

/// Root structure of config.yaml
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Hosting accounts, keyed by a free-form label
    #[serde(rename = "aws_vars")]
    pub accounts: IndexMap<String, AccountConfig>,

    /// Front-end applications, keyed by a free-form label
    #[serde(rename = "frontend-ghost-app")]
    pub apps: IndexMap<String, FrontendAppConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
    #[serde(rename = "accountId", deserialize_with = "string_or_number")]
    pub account_id: String,
    pub region: String,
    /// Environment label used in bucket and parameter names (e.g. dev, prod)
    pub env: String,
    pub project: ProjectConfig,
    pub resources: ResourcesConfig,
    pub service_account: ServiceAccountConfig,
    /// Tags applied to every taggable resource of this account's stacks
    #[serde(default)]
    pub stack_tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectConfig {
    #[serde(rename = "shortName")]
    pub short_name: String,
    pub client: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResourcesConfig {
    #[serde(rename = "vpcId")]
    pub vpc_id: String,
    /// Subnets of the VPC. Services and load balancers are placed in the
    /// subnets whose zone is among the app's availability zones.
    #[serde(default)]
    pub subnets: Vec<SubnetConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubnetConfig {
    pub id: String,
    #[serde(rename = "availabilityZone")]
    pub availability_zone: String,
}

/// The account that owns the CodeCommit repository
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceAccountConfig {
    #[serde(rename = "accountId", deserialize_with = "string_or_number")]
    pub account_id: String,
    pub region: String,
    /// Role in the service account assumed by the pipeline's source action
    #[serde(rename = "crossAccountRole")]
    pub cross_account_role: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FrontendAppConfig {
    pub code: CodeConfig,
    pub ecs: EcsConfig,
    pub lb: LoadBalancerConfig,
    #[serde(default)]
    pub build: BuildPermissionsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CodeConfig {
    /// Application name, used for the ECR repository and task family
    pub name: String,
    #[serde(rename = "sourceRepo")]
    pub source_repo: String,
    #[serde(rename = "sourceBranch")]
    pub source_branch: String,
    /// Path of the buildspec file inside the source repository
    pub buildspec_path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EcsConfig {
    pub td_cpu: u32,
    pub td_memory: u32,
    pub container_cpu: u32,
    pub container_memory: u32,
    pub container_port: u32,
    pub host_port: u32,
    pub cluster_name: String,
    #[serde(default)]
    pub availability_zones: Option<Vec<String>>,
    #[serde(default)]
    pub image: Option<String>,
}

impl EcsConfig {
    /// Zones to place the service and load balancer in, defaulting to the
    /// first three zones of the region
    pub fn zones_for(&self, region: &str) -> Vec<String> {
        match &self.availability_zones {
            Some(zones) if !zones.is_empty() => zones.clone(),
            _ => ["a", "b", "c"]
                .iter()
                .map(|suffix| format!("{}{}", region, suffix))
                .collect(),
        }
    }

    pub fn image(&self) -> &str {
        self.image.as_deref().unwrap_or(DEFAULT_CONTAINER_IMAGE)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoadBalancerConfig {
    /// Listener port. The historical key is misspelled and kept for compatibility.
    #[serde(rename = "targer_port", alias = "target_port")]
    pub target_port: u32,
    pub certificate_arn: String,
}

/// Resources the build project reads from outside this deployment. Both
/// statements are left out of the build role when the ARN is not configured.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BuildPermissionsConfig {
    /// ECR repository hosting the Ghost base image
    #[serde(default)]
    pub base_image_repository_arn: Option<String>,
    /// S3 bucket holding the buildspec file
    #[serde(default)]
    pub source_bucket_arn: Option<String>,
}

impl AppConfig {
    /// Load, substitute environment variables, and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("Loading configuration from {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_yaml_str(&content, &path.display().to_string())
    }

    /// Parse config from YAML text. `origin` only labels errors and warnings.
    ///
    /// Variables are substituted in the raw text, so they may stand in for
    /// numbers and booleans as well as strings.
    pub fn from_yaml_str(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let parse_err = |source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        };

        let content = substitute_env_vars(content);
        let value: serde_yaml::Value = serde_yaml::from_str(&content).map_err(parse_err)?;

        // Deserialize and collect any unused fields
        let mut unused_fields = Vec::new();
        let config: AppConfig = serde_ignored::deserialize(value, |path| {
            unused_fields.push(path.to_string());
        })
        .map_err(parse_err)?;

        for field in &unused_fields {
            warn!("Unknown configuration field in {}: {}", origin, field);
        }

        config.validate()?;
        debug!(
            accounts = config.accounts.len(),
            apps = config.apps.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Check every account and app, reporting all problems at once
    pub fn validate(&self) -> Result<(), ConfigError> {
        let problems = validation::collect_problems(self);
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }
}

/// Replace ${VAR_NAME} or ${VAR_NAME:-default} with environment variable values
pub fn substitute_env_vars(s: &str) -> String {
    ENV_VAR_PATTERN
        .replace_all(s, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default_value = caps.get(2).map(|m| m.as_str());

            match env::var(var_name) {
                Ok(val) => val,
                Err(_) => default_value.unwrap_or("").to_string(),
            }
        })
        .to_string()
}

/// Account IDs are often written unquoted in YAML and parse as integers
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(u64),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}
