//! Build and deploy pipeline stack.
//!
//! The pipeline is started by an EventBridge rule that receives CodeCommit
//! events forwarded from the service account.

use super::events::codecommit_branch_pattern;
use super::network::{
    container_security_group, egress_only_security_group, select_subnets,
    select_subnets_one_per_zone,
};
use super::{ComputeStackOutputs, Environment, Stack};
use crate::config::{AccountConfig, FrontendAppConfig};
use crate::error::SynthError;
use crate::iam::{
    grant_encrypt_decrypt, grant_pull, grant_pull_push, grant_read_write, PolicyStatement,
    ServiceRole,
};
use crate::names;
use crate::template::intrinsics::{
    get_att, import_value, join, reference, sub, AWS_PARTITION, AWS_REGION,
};
use crate::template::{logical_id, Output, Parameter, RemovalPolicy, Resource};
use serde_json::{json, Value};
use tracing::{info, warn};

pub const BUILD_IMAGE: &str = "aws/codebuild/standard:5.0";
pub const BUILD_COMPUTE_TYPE: &str = "BUILD_GENERAL1_SMALL";
const DEPLOYMENT_TIMEOUT_MINUTES: u32 = 18;

const SOURCE_ARTIFACT: &str = "source";
const BUILD_ARTIFACT: &str = "build";

pub fn build(
    account: &AccountConfig,
    app: &FrontendAppConfig,
    compute: &ComputeStackOutputs,
) -> Result<Stack, SynthError> {
    let name = names::pipeline_stack_name(account);
    let app_name = &app.code.name;
    info!(stack = %name, app = %app_name, "Building pipeline stack");

    let mut stack = Stack::new(
        &name,
        Environment::new(&account.account_id, &account.region),
        Some(format!("Build and deploy pipeline for {}", app_name)),
    );
    stack.add_dependency(&compute.stack_name);
    let service_name = import_value(&compute.service_name_export);

    let ecr = stack.add(
        &["ecr"],
        Resource::new("AWS::ECR::Repository", json!({ "RepositoryName": app_name }))
            .removal_policy(RemovalPolicy::Destroy),
    )?;

    let artifacts_bucket = stack.add(
        &["artifacts_bucket"],
        Resource::new(
            "AWS::S3::Bucket",
            json!({ "BucketName": names::artifacts_bucket_name(account) }),
        )
        .removal_policy(RemovalPolicy::Retain),
    )?;

    // Cross-account artifact store, resolved from SSM at deploy time
    let key_parameter = stack.add_parameter(
        &["kms_arn_string", "Parameter"],
        Parameter::ssm_string(&names::artifacts_key_parameter(account)),
    )?;
    let bucket_parameter = stack.add_parameter(
        &["bucket_name_string", "Parameter"],
        Parameter::ssm_string(&names::artifacts_bucket_parameter(account)),
    )?;
    let store_bucket_arn = join(
        "",
        vec![
            json!("arn:"),
            reference(AWS_PARTITION),
            json!(":s3:::"),
            reference(&bucket_parameter),
        ],
    );
    let store_key_arn = reference(&key_parameter);

    let subnets = select_subnets(account, app)?;
    let build_security_group =
        egress_only_security_group(&mut stack, &["buildproject", "SecurityGroup"], account)?;
    declare_endpoint(&mut stack, account, app, &build_security_group)?;

    // Build project
    let mut build_role = ServiceRole::new("codebuild.amazonaws.com");
    build_role.add_all(build_role_statements(
        account,
        app,
        &ecr,
        &artifacts_bucket,
        &store_bucket_arn,
        &store_key_arn,
    )?);
    let build_role = stack.add_role(&["buildproject", "Role"], build_role)?;

    // The default policy names the project's log group and cannot be waited
    // on. The VPC permissions must exist before the project is created.
    let vpc_policy = stack.add_policy(
        &["buildproject", "PolicyDocument"],
        &build_role.role,
        vpc_statements(&subnets)?,
    )?;

    let project = stack.add(
        &["buildproject"],
        Resource::new(
            "AWS::CodeBuild::Project",
            json!({
                "Description": format!("Build docker image for {}", app_name),
                "ServiceRole": get_att(&build_role.role, "Arn"),
                "Source": { "Type": "CODEPIPELINE", "BuildSpec": app.code.buildspec_path },
                "Artifacts": { "Type": "CODEPIPELINE" },
                "EncryptionKey": store_key_arn,
                "Environment": {
                    "Type": "LINUX_CONTAINER",
                    "Image": BUILD_IMAGE,
                    "ComputeType": BUILD_COMPUTE_TYPE,
                    "PrivilegedMode": true,
                    "ImagePullCredentialsType": "CODEBUILD",
                    "EnvironmentVariables": build_environment(account, app, &ecr, &artifacts_bucket, &service_name),
                },
                "VpcConfig": {
                    "VpcId": account.resources.vpc_id,
                    "Subnets": subnets,
                    "SecurityGroupIds": [get_att(&build_security_group, "GroupId")],
                },
            }),
        )
        .depends_on(&build_role.role)
        .depends_on(&vpc_policy),
    )?;

    // Pipeline
    let pipeline_id = format!("pipeline-{}", app_name);
    let pipeline_path = pipeline_id.as_str();
    let mut pipeline_role = ServiceRole::new("codepipeline.amazonaws.com");
    pipeline_role.add_all(pipeline_role_statements(
        account,
        &project,
        &store_bucket_arn,
        &store_key_arn,
    )?);
    let pipeline_role = stack.add_role(&[pipeline_path, "Role"], pipeline_role)?;

    let pipeline = stack.add(
        &[pipeline_path],
        pipeline_role.gate(Resource::new(
            "AWS::CodePipeline::Pipeline",
            json!({
                "Name": pipeline_path,
                "RoleArn": get_att(&pipeline_role.role, "Arn"),
                "RestartExecutionOnUpdate": true,
                "ArtifactStore": {
                    "Type": "S3",
                    "Location": reference(&bucket_parameter),
                    "EncryptionKey": { "Id": store_key_arn, "Type": "KMS" },
                },
                "Stages": [
                    source_stage(account, app),
                    build_stage(&project),
                    deploy_stage(compute, service_name),
                ],
            }),
        )),
    )?;
    let pipeline_arn = sub(&format!(
        "arn:${{AWS::Partition}}:codepipeline:${{AWS::Region}}:${{AWS::AccountId}}:${{{}}}",
        pipeline
    ));

    container_security_group(&mut stack, "sgforcontainer", account, app)?;

    // Trigger
    let mut events_role = ServiceRole::new("events.amazonaws.com");
    events_role.add_to_policy(PolicyStatement::allow(
        &["codepipeline:StartPipelineExecution"],
        vec![pipeline_arn.clone()],
    )?);
    let events_role = stack.add_role(&[pipeline_path, "EventsRole"], events_role)?;

    stack.add(
        &["eventrule"],
        events_role.gate(Resource::new(
            "AWS::Events::Rule",
            json!({
                "EventPattern": codecommit_branch_pattern(account, app),
                "State": "ENABLED",
                "Targets": [{
                    "Arn": pipeline_arn,
                    "Id": "Target0",
                    "RoleArn": get_att(&events_role.role, "Arn"),
                }],
            }),
        )),
    )?;

    let service_account = &account.service_account.account_id;
    stack.add(
        &["servicebuspolicy"],
        Resource::new(
            "AWS::Events::EventBusPolicy",
            json!({
                "EventBusName": "default",
                "StatementId": format!("AllowPutEventsFrom{}", service_account),
                "Action": "events:PutEvents",
                "Principal": service_account,
            }),
        ),
    )?;

    stack.add_output(
        "ecr_name",
        Output::new("ECR Admin App name", reference(&ecr)),
    )?;

    Ok(stack)
}

/// Interface endpoint for CodePipeline, reachable from the build project
fn declare_endpoint(
    stack: &mut Stack,
    account: &AccountConfig,
    app: &FrontendAppConfig,
    build_security_group: &str,
) -> Result<String, SynthError> {
    let description = format!("{}/endpoint/SecurityGroup", stack.name());
    let endpoint_security_group = stack.add(
        &["endpoint", "SecurityGroup"],
        Resource::new(
            "AWS::EC2::SecurityGroup",
            json!({
                "GroupDescription": description,
                "VpcId": account.resources.vpc_id,
                "SecurityGroupIngress": [{
                    "Description": "HTTPS from the build project",
                    "FromPort": 443,
                    "ToPort": 443,
                    "IpProtocol": "tcp",
                    "SourceSecurityGroupId": get_att(build_security_group, "GroupId"),
                }],
            }),
        ),
    )?;

    stack.add(
        &["endpoint"],
        Resource::new(
            "AWS::EC2::VPCEndpoint",
            json!({
                "ServiceName": join(
                    "",
                    vec![json!("com.amazonaws."), reference(AWS_REGION), json!(".codepipeline")],
                ),
                "VpcEndpointType": "Interface",
                "VpcId": account.resources.vpc_id,
                "PrivateDnsEnabled": false,
                "SubnetIds": select_subnets_one_per_zone(account, app)?,
                "SecurityGroupIds": [get_att(&endpoint_security_group, "GroupId")],
            }),
        ),
    )
}

fn build_environment(
    account: &AccountConfig,
    app: &FrontendAppConfig,
    ecr: &str,
    artifacts_bucket: &str,
    service_name: &Value,
) -> Value {
    let variables = [
        (
            "REPOSITORY_URI",
            sub(&format!(
                "${{AWS::AccountId}}.dkr.ecr.${{AWS::Region}}.${{AWS::URLSuffix}}/${{{}}}",
                ecr
            )),
        ),
        ("BRANCH", json!(app.code.source_branch)),
        ("ACCOUNT_ID", json!(account.account_id)),
        ("ARTIFACTS_BUCKET", reference(artifacts_bucket)),
        ("ECS_SERVICE_NAME", service_name.clone()),
        ("AWS_REGION", json!(account.region)),
        ("FAMILY", json!(app.code.name)),
    ];

    Value::Array(
        variables
            .into_iter()
            .map(|(name, value)| json!({ "Name": name, "Type": "PLAINTEXT", "Value": value }))
            .collect(),
    )
}

/// Network interface permissions CodeBuild checks when a VPC project is created
fn vpc_statements(subnets: &[String]) -> Result<Vec<PolicyStatement>, SynthError> {
    let subnet_arns: Vec<Value> = subnets
        .iter()
        .map(|id| {
            sub(&format!(
                "arn:${{AWS::Partition}}:ec2:${{AWS::Region}}:${{AWS::AccountId}}:subnet/{}",
                id
            ))
        })
        .collect();

    Ok(vec![
        PolicyStatement::allow(
            &[
                "ec2:CreateNetworkInterface",
                "ec2:DescribeNetworkInterfaces",
                "ec2:DeleteNetworkInterface",
                "ec2:DescribeSubnets",
                "ec2:DescribeSecurityGroups",
                "ec2:DescribeDhcpOptions",
                "ec2:DescribeVpcs",
            ],
            vec![json!("*")],
        )?,
        PolicyStatement::allow(
            &["ec2:CreateNetworkInterfacePermission"],
            vec![sub(
                "arn:${AWS::Partition}:ec2:${AWS::Region}:${AWS::AccountId}:network-interface/*",
            )],
        )?
        .with_condition(json!({
            "StringEquals": {
                "ec2:Subnet": subnet_arns,
                "ec2:AuthorizedService": "codebuild.amazonaws.com",
            }
        })),
    ])
}

fn build_role_statements(
    account: &AccountConfig,
    app: &FrontendAppConfig,
    ecr: &str,
    artifacts_bucket: &str,
    store_bucket_arn: &Value,
    store_key_arn: &Value,
) -> Result<Vec<PolicyStatement>, SynthError> {
    // The project is declared after its role, so its logical ID is derived here
    let log_group = format!(
        "arn:${{AWS::Partition}}:logs:${{AWS::Region}}:${{AWS::AccountId}}:log-group:/aws/codebuild/${{{}}}",
        logical_id(&["buildproject"])
    );

    let mut statements = vec![PolicyStatement::allow(
        &["logs:CreateLogGroup", "logs:CreateLogStream", "logs:PutLogEvents"],
        vec![sub(&log_group), sub(&format!("{}:*", log_group))],
    )?];

    statements.extend(grant_pull_push(get_att(ecr, "Arn"))?);
    statements.push(grant_read_write(get_att(artifacts_bucket, "Arn"))?);
    statements.push(PolicyStatement::allow(
        &["codecommit:GetBranch", "codecommit:GetCommit"],
        vec![json!(names::codecommit_repository_arn(account, app))],
    )?);

    match &app.build.base_image_repository_arn {
        Some(arn) => statements.push(grant_pull(json!(arn))?),
        None => warn!(
            app = %app.code.name,
            "build.base_image_repository_arn is not set, build role cannot pull the base image"
        ),
    }

    match &app.build.source_bucket_arn {
        Some(arn) => statements.push(PolicyStatement::allow(
            &[
                "s3:PutObject*",
                "s3:GetBucket*",
                "s3:GetObject*",
                "s3:ListBucket",
                "s3:DeleteObject",
            ],
            vec![json!(arn), json!(format!("{}/*", arn))],
        )?),
        None => warn!(
            app = %app.code.name,
            "build.source_bucket_arn is not set, build role cannot read the buildspec bucket"
        ),
    }

    statements.push(PolicyStatement::allow(&["iam:CreateRole"], vec![json!("*")])?);

    // The pipeline hands artifacts to the build through the cross-account store
    statements.push(grant_read_write(store_bucket_arn.clone())?);
    statements.push(grant_encrypt_decrypt(store_key_arn.clone())?);

    Ok(statements)
}

fn pipeline_role_statements(
    account: &AccountConfig,
    project: &str,
    store_bucket_arn: &Value,
    store_key_arn: &Value,
) -> Result<Vec<PolicyStatement>, SynthError> {
    Ok(vec![
        grant_encrypt_decrypt(store_key_arn.clone())?,
        PolicyStatement::allow(
            &["sts:AssumeRole"],
            vec![json!(format!(
                "arn:aws:iam::{}:role/*",
                account.service_account.account_id
            ))],
        )?,
        grant_read_write(store_bucket_arn.clone())?,
        PolicyStatement::allow(
            &[
                "codebuild:BatchGetBuilds",
                "codebuild:StartBuild",
                "codebuild:StopBuild",
            ],
            vec![get_att(project, "Arn")],
        )?,
        PolicyStatement::allow(
            &[
                "ecs:DescribeServices",
                "ecs:DescribeTaskDefinition",
                "ecs:DescribeTasks",
                "ecs:ListTasks",
                "ecs:RegisterTaskDefinition",
                "ecs:TagResource",
                "ecs:UpdateService",
            ],
            vec![json!("*")],
        )?,
        PolicyStatement::allow(&["iam:PassRole"], vec![json!("*")])?.with_condition(json!({
            "StringEqualsIfExists": { "iam:PassedToService": ["ecs-tasks.amazonaws.com"] }
        })),
    ])
}

fn action_type(category: &str, provider: &str) -> Value {
    json!({ "Category": category, "Owner": "AWS", "Provider": provider, "Version": "1" })
}

fn source_stage(account: &AccountConfig, app: &FrontendAppConfig) -> Value {
    json!({
        "Name": "source",
        "Actions": [{
            "Name": "source",
            "ActionTypeId": action_type("Source", "CodeCommit"),
            "Configuration": {
                "RepositoryName": app.code.source_repo,
                "BranchName": app.code.source_branch,
                "PollForSourceChanges": false,
            },
            "OutputArtifacts": [{ "Name": SOURCE_ARTIFACT }],
            "RoleArn": account.service_account.cross_account_role,
            "RunOrder": 1,
        }],
    })
}

fn build_stage(project: &str) -> Value {
    json!({
        "Name": "build",
        "Actions": [{
            "Name": "build-image",
            "ActionTypeId": action_type("Build", "CodeBuild"),
            "Configuration": { "ProjectName": reference(project) },
            "InputArtifacts": [{ "Name": SOURCE_ARTIFACT }],
            "OutputArtifacts": [{ "Name": BUILD_ARTIFACT }],
            "Namespace": "BuildVariables",
            "RunOrder": 1,
        }],
    })
}

fn deploy_stage(compute: &ComputeStackOutputs, service_name: Value) -> Value {
    json!({
        "Name": "deploy",
        "Actions": [{
            "Name": "deploy-to-ecs",
            "ActionTypeId": action_type("Deploy", "ECS"),
            "Configuration": {
                "ClusterName": compute.cluster_name,
                "ServiceName": service_name,
                "DeploymentTimeout": DEPLOYMENT_TIMEOUT_MINUTES.to_string(),
            },
            "InputArtifacts": [{ "Name": BUILD_ARTIFACT }],
            "RunOrder": 1,
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::sample_config;
    use crate::config::AppConfig;
    use crate::stacks::compute;

    fn pipeline_for(config: &AppConfig) -> Stack {
        let account = config.accounts.get("dev").unwrap();
        let app = config.apps.get("blog").unwrap();
        let (_, outputs) = compute::build(account, app).unwrap();
        build(account, app, &outputs).unwrap()
    }

    fn single<'a>(stack: &'a Stack, resource_type: &'a str) -> &'a Resource {
        let mut matches = stack.template().resources_of_type(resource_type);
        let (_, resource) = matches.next().unwrap();
        assert!(matches.next().is_none(), "more than one {}", resource_type);
        resource
    }

    fn policy_actions(stack: &Stack, role_path: &[&str]) -> Vec<String> {
        let mut policy_path = role_path.to_vec();
        policy_path.push("DefaultPolicy");
        let policy = &stack.template().resources[&logical_id(&policy_path)];
        policy.properties["PolicyDocument"]["Statement"]
            .as_array()
            .unwrap()
            .iter()
            .flat_map(|statement| match &statement["Action"] {
                Value::Array(actions) => actions.clone(),
                action => vec![action.clone()],
            })
            .map(|action| action.as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_depends_on_compute_stack() {
        let stack = pipeline_for(&sample_config());
        assert_eq!(
            stack.dependencies(),
            &["cdk-fe-ghost-app-infra-pipeline-ghost-111111111111".to_string()]
        );
    }

    #[test]
    fn test_repository_and_bucket_policies() {
        let stack = pipeline_for(&sample_config());

        let ecr = single(&stack, "AWS::ECR::Repository");
        assert_eq!(ecr.properties["RepositoryName"], "ghost-blog");
        assert_eq!(ecr.deletion_policy.as_deref(), Some("Delete"));

        let bucket = single(&stack, "AWS::S3::Bucket");
        assert_eq!(
            bucket.properties["BucketName"],
            "dev.fr-artifacts.111111111111.ghost.acme.s3"
        );
        assert_eq!(bucket.deletion_policy.as_deref(), Some("Retain"));
    }

    #[test]
    fn test_ssm_parameters() {
        let stack = pipeline_for(&sample_config());
        let defaults: Vec<&Value> = stack
            .template()
            .parameters
            .values()
            .filter_map(|p| p.default.as_ref())
            .collect();
        assert!(defaults.contains(&&json!(
            "dev.crossaccount-artifacts-backet-key-111111111111.ghost.secret"
        )));
        assert!(defaults.contains(&&json!(
            "dev.crossaccount-artifacts-backet-name-111111111111.ghost.name"
        )));
    }

    #[test]
    fn test_build_project() {
        let stack = pipeline_for(&sample_config());
        let project = single(&stack, "AWS::CodeBuild::Project");

        assert_eq!(project.properties["Description"], "Build docker image for ghost-blog");
        assert_eq!(project.properties["Source"]["BuildSpec"], "buildspec.yml");
        let environment = &project.properties["Environment"];
        assert_eq!(environment["Image"], BUILD_IMAGE);
        assert_eq!(environment["PrivilegedMode"], true);
        assert_eq!(environment["ComputeType"], BUILD_COMPUTE_TYPE);

        let variables: Vec<&str> = environment["EnvironmentVariables"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["Name"].as_str().unwrap())
            .collect();
        assert_eq!(
            variables,
            vec![
                "REPOSITORY_URI",
                "BRANCH",
                "ACCOUNT_ID",
                "ARTIFACTS_BUCKET",
                "ECS_SERVICE_NAME",
                "AWS_REGION",
                "FAMILY"
            ]
        );
        assert_eq!(
            environment["EnvironmentVariables"][4]["Value"],
            json!({ "Fn::ImportValue": "cdk-fe-ghost-app-infra-pipeline-ghost-111111111111-ecs-service-name" })
        );
        assert_eq!(
            project.properties["VpcConfig"]["Subnets"],
            json!(["subnet-a", "subnet-b", "subnet-c"])
        );
    }

    #[test]
    fn test_build_project_waits_for_vpc_permissions() {
        let stack = pipeline_for(&sample_config());
        let project = single(&stack, "AWS::CodeBuild::Project");

        let vpc_policy = stack
            .template()
            .resources_of_type("AWS::IAM::Policy")
            .find(|(_, policy)| {
                policy.properties["PolicyDocument"]["Statement"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .any(|s| s["Action"].to_string().contains("ec2:CreateNetworkInterface"))
            })
            .map(|(id, _)| id.clone())
            .unwrap();

        assert!(project.depends_on.contains(&vpc_policy));
        assert_eq!(
            stack.template().resources[&vpc_policy].properties["Roles"],
            json!([{ "Ref": logical_id(&["buildproject", "Role"]) }])
        );

        // The default policy references the project, so it must not hold the
        // permissions the project needs at creation
        let default_policy = logical_id(&["buildproject", "Role", "DefaultPolicy"]);
        assert!(!project.depends_on.contains(&default_policy));
        let actions = policy_actions(&stack, &["buildproject", "Role"]);
        assert!(!actions.contains(&"ec2:CreateNetworkInterface".to_string()));
    }

    #[test]
    fn test_build_role_without_optional_grants() {
        let stack = pipeline_for(&sample_config());
        let actions = policy_actions(&stack, &["buildproject", "Role"]);

        assert!(actions.contains(&"codecommit:GetBranch".to_string()));
        assert!(actions.contains(&"iam:CreateRole".to_string()));
        assert!(actions.contains(&"ecr:PutImage".to_string()));
        assert!(!actions.contains(&"s3:ListBucket".to_string()));
    }

    #[test]
    fn test_build_role_with_optional_grants() {
        let yaml = crate::config::tests::SAMPLE_CONFIG.replace(
            "      certificate_arn: arn:aws:acm:eu-central-1:111111111111:certificate/abc-123\n",
            "      certificate_arn: arn:aws:acm:eu-central-1:111111111111:certificate/abc-123\n    build:\n      base_image_repository_arn: arn:aws:ecr:eu-central-1:333333333333:repository/ghost\n      source_bucket_arn: arn:aws:s3:::buildspecs\n",
        );
        let config = AppConfig::from_yaml_str(&yaml, "t").unwrap();
        let stack = pipeline_for(&config);

        let policy = &stack.template().resources[&logical_id(&["buildproject", "Role", "DefaultPolicy"])];
        let statements = policy.properties["PolicyDocument"]["Statement"]
            .as_array()
            .unwrap();
        assert!(statements.iter().any(|s| s["Resource"]
            == json!("arn:aws:ecr:eu-central-1:333333333333:repository/ghost")));
        assert!(statements.iter().any(|s| s["Resource"]
            == json!(["arn:aws:s3:::buildspecs", "arn:aws:s3:::buildspecs/*"])));
    }

    #[test]
    fn test_pipeline_stages() {
        let stack = pipeline_for(&sample_config());
        let pipeline = single(&stack, "AWS::CodePipeline::Pipeline");

        assert_eq!(pipeline.properties["Name"], "pipeline-ghost-blog");
        assert_eq!(pipeline.properties["RestartExecutionOnUpdate"], true);
        assert_eq!(pipeline.properties["ArtifactStore"]["EncryptionKey"]["Type"], "KMS");

        let stages = pipeline.properties["Stages"].as_array().unwrap();
        let names: Vec<&str> = stages.iter().map(|s| s["Name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["source", "build", "deploy"]);

        let source = &stages[0]["Actions"][0];
        assert_eq!(source["Configuration"]["PollForSourceChanges"], false);
        assert_eq!(
            source["RoleArn"],
            "arn:aws:iam::222222222222:role/codecommit-cross-account"
        );

        let build = &stages[1]["Actions"][0];
        assert_eq!(build["Name"], "build-image");
        assert_eq!(build["Namespace"], "BuildVariables");

        let deploy = &stages[2]["Actions"][0];
        assert_eq!(deploy["Name"], "deploy-to-ecs");
        assert_eq!(deploy["Configuration"]["ClusterName"], "ghost-cluster");
        assert_eq!(deploy["Configuration"]["DeploymentTimeout"], "18");
        assert_eq!(deploy["InputArtifacts"][0]["Name"], "build");

        let role = logical_id(&["pipeline-ghost-blog", "Role", "DefaultPolicy"]);
        assert!(pipeline.depends_on.contains(&role));
    }

    #[test]
    fn test_pipeline_role_grants() {
        let stack = pipeline_for(&sample_config());
        let actions = policy_actions(&stack, &["pipeline-ghost-blog", "Role"]);
        for expected in [
            "kms:Decrypt",
            "sts:AssumeRole",
            "codebuild:StartBuild",
            "ecs:UpdateService",
            "iam:PassRole",
        ] {
            assert!(actions.contains(&expected.to_string()), "missing {}", expected);
        }
    }

    #[test]
    fn test_event_rule_targets_pipeline() {
        let stack = pipeline_for(&sample_config());
        let rule = single(&stack, "AWS::Events::Rule");

        assert_eq!(rule.properties["State"], "ENABLED");
        assert_eq!(
            rule.properties["EventPattern"]["source"],
            json!(["aws.codecommit"])
        );
        let target = &rule.properties["Targets"][0];
        assert_eq!(target["Id"], "Target0");
        assert!(target["RoleArn"]["Fn::GetAtt"].is_array());

        let bus_policy = single(&stack, "AWS::Events::EventBusPolicy");
        assert_eq!(bus_policy.properties["Principal"], "222222222222");
    }

    #[test]
    fn test_endpoint_and_output() {
        let stack = pipeline_for(&sample_config());
        let endpoint = single(&stack, "AWS::EC2::VPCEndpoint");
        assert_eq!(endpoint.properties["PrivateDnsEnabled"], false);
        assert_eq!(endpoint.properties["VpcEndpointType"], "Interface");

        let output = &stack.template().outputs["ecrname"];
        assert_eq!(output.description.as_deref(), Some("ECR Admin App name"));
    }
}
