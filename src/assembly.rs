//! Cloud assembly output.
//!
//! An assembly directory holds one `<stack>.template.json` per stack plus a
//! `manifest.json` naming each stack's target environment, template file,
//! and the stacks it must be deployed after.

use crate::error::SynthError;
use crate::stacks::Stack;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const MANIFEST_VERSION: &str = "36.0.0";
const STACK_ARTIFACT_TYPE: &str = "aws:cloudformation:stack";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    pub version: String,
    pub artifacts: BTreeMap<String, ArtifactManifest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtifactManifest {
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub environment: String,
    pub properties: ArtifactProperties,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactProperties {
    pub template_file: String,
}

/// Synthesized stacks, in declaration order
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    stacks: Vec<Stack>,
}

impl Assembly {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stack. Stack names are unique within an assembly.
    pub fn push(&mut self, stack: Stack) -> Result<(), SynthError> {
        if self.stacks.iter().any(|s| s.name() == stack.name()) {
            return Err(SynthError::DuplicateStack(stack.name().to_string()));
        }
        self.stacks.push(stack);
        Ok(())
    }

    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    pub fn stack(&self, name: &str) -> Result<&Stack, SynthError> {
        self.stacks
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| SynthError::StackNotFound(name.to_string()))
    }

    pub fn template_file(stack: &Stack) -> String {
        format!("{}.template.json", stack.name())
    }

    pub fn manifest(&self) -> Manifest {
        let artifacts = self
            .stacks
            .iter()
            .map(|stack| {
                let artifact = ArtifactManifest {
                    artifact_type: STACK_ARTIFACT_TYPE.to_string(),
                    environment: stack.environment().to_string(),
                    properties: ArtifactProperties {
                        template_file: Self::template_file(stack),
                    },
                    dependencies: stack.dependencies().to_vec(),
                };
                (stack.name().to_string(), artifact)
            })
            .collect();

        Manifest {
            version: MANIFEST_VERSION.to_string(),
            artifacts,
        }
    }

    /// Write every template and the manifest into `dir`, creating it if needed
    pub fn write(&self, dir: impl AsRef<Path>) -> Result<(), SynthError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        for stack in &self.stacks {
            let path = dir.join(Self::template_file(stack));
            let json = serde_json::to_string_pretty(stack.template())?;
            fs::write(&path, json)?;
            debug!("Wrote template {}", path.display());
        }

        let manifest = serde_json::to_string_pretty(&self.manifest())?;
        fs::write(dir.join(MANIFEST_FILE), manifest)?;

        info!(
            stacks = self.stacks.len(),
            "Cloud assembly written to {}",
            dir.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stacks::Environment;
    use crate::template::Resource;
    use serde_json::json;

    fn stack(name: &str) -> Stack {
        let mut stack = Stack::new(name, Environment::new("111111111111", "eu-central-1"), None);
        stack
            .add(&["bucket"], Resource::new("AWS::S3::Bucket", json!({})))
            .unwrap();
        stack
    }

    #[test]
    fn test_duplicate_stack_rejected() {
        let mut assembly = Assembly::new();
        assembly.push(stack("a")).unwrap();
        let err = assembly.push(stack("a")).unwrap_err();
        assert!(matches!(err, SynthError::DuplicateStack(name) if name == "a"));
    }

    #[test]
    fn test_stack_lookup() {
        let mut assembly = Assembly::new();
        assembly.push(stack("a")).unwrap();
        assert_eq!(assembly.stack("a").unwrap().name(), "a");
        assert!(matches!(
            assembly.stack("missing"),
            Err(SynthError::StackNotFound(_))
        ));
    }

    #[test]
    fn test_write_assembly() {
        let mut assembly = Assembly::new();
        assembly.push(stack("first")).unwrap();
        let mut second = stack("second");
        second.add_dependency("first");
        assembly.push(second).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("cdk.out");
        assembly.write(&out).unwrap();

        assert!(out.join("first.template.json").exists());
        assert!(out.join("second.template.json").exists());

        let manifest: Manifest =
            serde_json::from_str(&fs::read_to_string(out.join(MANIFEST_FILE)).unwrap()).unwrap();
        assert_eq!(manifest.artifacts.len(), 2);
        let second = &manifest.artifacts["second"];
        assert_eq!(second.artifact_type, "aws:cloudformation:stack");
        assert_eq!(second.environment, "aws://111111111111/eu-central-1");
        assert_eq!(second.properties.template_file, "second.template.json");
        assert_eq!(second.dependencies, vec!["first".to_string()]);
        assert!(manifest.artifacts["first"].dependencies.is_empty());
    }
}
