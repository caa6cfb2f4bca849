//! Synthesizes the CloudFormation stacks that build, deploy and run the
//! Ghost front-end on ECS/Fargate.
//!
//! [`config::AppConfig`] is read from YAML, [`app::synthesize`] declares one
//! compute, pipeline and event-forwarding stack per account and app, and the
//! resulting [`assembly::Assembly`] is written as a cloud assembly directory.

pub mod app;
pub mod assembly;
pub mod config;
pub mod error;
pub mod iam;
pub mod names;
pub mod stacks;
pub mod template;

pub use app::synthesize;
pub use assembly::Assembly;
pub use config::AppConfig;
pub use error::{ConfigError, SynthError};
