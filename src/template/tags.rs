use super::Template;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Resource types in these stacks that accept a `Tags` list
const TAGGABLE_TYPES: &[&str] = &[
    "AWS::CodeBuild::Project",
    "AWS::CodePipeline::Pipeline",
    "AWS::EC2::SecurityGroup",
    "AWS::ECR::Repository",
    "AWS::ECS::Service",
    "AWS::ECS::TaskDefinition",
    "AWS::ElasticLoadBalancingV2::LoadBalancer",
    "AWS::ElasticLoadBalancingV2::TargetGroup",
    "AWS::IAM::Role",
    "AWS::Logs::LogGroup",
    "AWS::S3::Bucket",
];

fn is_taggable(resource_type: &str) -> bool {
    TAGGABLE_TYPES.contains(&resource_type)
}

/// Add `tags` to every taggable resource of the template.
///
/// Tags already set on a resource win over stack tags with the same key.
/// The resulting list is sorted by key.
pub fn apply_tags(template: &mut Template, tags: &BTreeMap<String, String>) {
    if tags.is_empty() {
        return;
    }

    for resource in template.resources.values_mut() {
        if !is_taggable(&resource.resource_type) {
            continue;
        }

        let mut merged: BTreeMap<String, Value> = tags
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();

        if let Some(Value::Array(existing)) = resource.properties.get("Tags") {
            for tag in existing {
                if let (Some(Value::String(key)), Some(value)) = (tag.get("Key"), tag.get("Value"))
                {
                    merged.insert(key.clone(), value.clone());
                }
            }
        }

        let list: Vec<Value> = merged
            .into_iter()
            .map(|(key, value)| json!({ "Key": key, "Value": value }))
            .collect();

        if let Value::Object(properties) = &mut resource.properties {
            properties.insert("Tags".to_string(), Value::Array(list));
        } else {
            resource.properties = json!({ "Tags": list });
        }
    }
}
