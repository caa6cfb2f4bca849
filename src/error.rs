use thiserror::Error;

/// Errors raised while loading or validating the YAML configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration:\n  - {}", .0.join("\n  - "))]
    Invalid(Vec<String>),
}

/// Errors raised while declaring resources or assembling stacks
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("Duplicate logical ID '{logical_id}' in stack {stack}")]
    DuplicateLogicalId { stack: String, logical_id: String },

    #[error("Duplicate stack name '{0}'. Each account can host one front-end app per stack name")]
    DuplicateStack(String),

    #[error("Policy statement granting [{0}] has no resources")]
    EmptyResources(String),

    #[error("Policy statement has no actions")]
    EmptyActions,

    #[error(
        "No subnet of VPC {vpc_id} lies in the selected availability zones [{}]",
        .zones.join(", ")
    )]
    NoSubnetsInZones { vpc_id: String, zones: Vec<String> },

    #[error("Stack not found: {0}")]
    StackNotFound(String),

    #[error("Failed to write cloud assembly: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize template: {0}")]
    Serialize(#[from] serde_json::Error),
}
