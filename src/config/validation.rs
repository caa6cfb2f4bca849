//! Validation of config.yaml values.
//!
//! Problems are collected rather than returned one at a time, so a single
//! run of `check-config` reports everything wrong with a file.

use super::{AccountConfig, AppConfig, FrontendAppConfig};
use crate::names;
use regex::Regex;

lazy_static::lazy_static! {
    static ref ACCOUNT_ID: Regex = Regex::new(r"^\d{12}$").expect("valid regex");
    static ref REGION: Regex = Regex::new(r"^[a-z]{2}(-gov)?-[a-z]+-\d$").expect("valid regex");
    static ref IAM_ROLE_ARN: Regex =
        Regex::new(r"^arn:aws[a-z-]*:iam::\d{12}:role/.+$").expect("valid regex");
    static ref ACM_CERTIFICATE_ARN: Regex =
        Regex::new(r"^arn:aws[a-z-]*:acm:[a-z0-9-]+:\d{12}:certificate/.+$").expect("valid regex");
    static ref ECR_REPOSITORY_ARN: Regex =
        Regex::new(r"^arn:aws[a-z-]*:ecr:[a-z0-9-]+:\d{12}:repository/.+$").expect("valid regex");
    static ref S3_BUCKET_ARN: Regex =
        Regex::new(r"^arn:aws[a-z-]*:s3:::[a-z0-9][a-z0-9.-]{1,61}[a-z0-9]$").expect("valid regex");
    static ref ECR_REPOSITORY_NAME: Regex =
        Regex::new(r"^[a-z0-9]+(?:[._-][a-z0-9]+)*$").expect("valid regex");
    static ref BUCKET_NAME: Regex =
        Regex::new(r"^[a-z0-9][a-z0-9.-]{1,61}[a-z0-9]$").expect("valid regex");
}

/// Valid Fargate task sizes: cpu units → allowed memory in MiB
fn fargate_memory_options(cpu: u32) -> Option<Vec<u32>> {
    let range = |from: u32, to: u32, step: u32| (from..=to).step_by(step as usize).collect();
    match cpu {
        256 => Some(vec![512, 1024, 2048]),
        512 => Some(range(1024, 4096, 1024)),
        1024 => Some(range(2048, 8192, 1024)),
        2048 => Some(range(4096, 16384, 1024)),
        4096 => Some(range(8192, 30720, 1024)),
        8192 => Some(range(16384, 61440, 4096)),
        16384 => Some(range(32768, 122880, 8192)),
        _ => None,
    }
}

pub(super) fn collect_problems(config: &AppConfig) -> Vec<String> {
    let mut problems = Vec::new();

    if config.accounts.is_empty() {
        problems.push("aws_vars: at least one account is required".to_string());
    }
    if config.apps.is_empty() {
        problems.push("frontend-ghost-app: at least one app is required".to_string());
    }

    for (label, account) in config.accounts.iter() {
        check_account(&format!("aws_vars.{}", label), account, &mut problems);

        for (app_label, app) in config.apps.iter() {
            check_app_in_account(
                &format!("frontend-ghost-app.{}", app_label),
                account,
                app,
                &mut problems,
            );
        }
    }

    for (label, app) in config.apps.iter() {
        check_app(&format!("frontend-ghost-app.{}", label), app, &mut problems);
    }

    problems
}

fn require_non_empty(path: &str, value: &str, problems: &mut Vec<String>) {
    if value.trim().is_empty() {
        problems.push(format!("{}: must not be empty", path));
    }
}

fn require_match(path: &str, value: &str, pattern: &Regex, what: &str, problems: &mut Vec<String>) {
    if !pattern.is_match(value) {
        problems.push(format!("{}: '{}' is not {}", path, value, what));
    }
}

fn require_port(path: &str, port: u32, problems: &mut Vec<String>) {
    if port == 0 || port > 65535 {
        problems.push(format!("{}: port {} is outside 1-65535", path, port));
    }
}

fn check_account(path: &str, account: &AccountConfig, problems: &mut Vec<String>) {
    require_match(
        &format!("{}.accountId", path),
        &account.account_id,
        &ACCOUNT_ID,
        "a 12-digit account ID",
        problems,
    );
    require_match(
        &format!("{}.region", path),
        &account.region,
        &REGION,
        "an AWS region",
        problems,
    );
    require_non_empty(&format!("{}.env", path), &account.env, problems);
    require_non_empty(
        &format!("{}.project.shortName", path),
        &account.project.short_name,
        problems,
    );
    require_non_empty(
        &format!("{}.project.client", path),
        &account.project.client,
        problems,
    );
    require_non_empty(
        &format!("{}.resources.vpcId", path),
        &account.resources.vpc_id,
        problems,
    );

    if account.resources.subnets.is_empty() {
        problems.push(format!(
            "{}.resources.subnets: at least one subnet is required",
            path
        ));
    }
    for (i, subnet) in account.resources.subnets.iter().enumerate() {
        require_non_empty(
            &format!("{}.resources.subnets[{}].id", path, i),
            &subnet.id,
            problems,
        );
        require_non_empty(
            &format!("{}.resources.subnets[{}].availabilityZone", path, i),
            &subnet.availability_zone,
            problems,
        );
    }

    let service = &account.service_account;
    require_match(
        &format!("{}.service_account.accountId", path),
        &service.account_id,
        &ACCOUNT_ID,
        "a 12-digit account ID",
        problems,
    );
    require_match(
        &format!("{}.service_account.region", path),
        &service.region,
        &REGION,
        "an AWS region",
        problems,
    );
    require_match(
        &format!("{}.service_account.crossAccountRole", path),
        &service.cross_account_role,
        &IAM_ROLE_ARN,
        "an IAM role ARN",
        problems,
    );

    let bucket = names::artifacts_bucket_name(account);
    if !BUCKET_NAME.is_match(&bucket) {
        problems.push(format!(
            "{}: derived artifacts bucket name '{}' is not a valid S3 bucket name",
            path, bucket
        ));
    }
}

fn check_app(path: &str, app: &FrontendAppConfig, problems: &mut Vec<String>) {
    require_match(
        &format!("{}.code.name", path),
        &app.code.name,
        &ECR_REPOSITORY_NAME,
        "a valid ECR repository name",
        problems,
    );
    require_non_empty(
        &format!("{}.code.sourceRepo", path),
        &app.code.source_repo,
        problems,
    );
    require_non_empty(
        &format!("{}.code.sourceBranch", path),
        &app.code.source_branch,
        problems,
    );
    require_non_empty(
        &format!("{}.code.buildspec_path", path),
        &app.code.buildspec_path,
        problems,
    );

    let ecs = &app.ecs;
    require_non_empty(
        &format!("{}.ecs.cluster_name", path),
        &ecs.cluster_name,
        problems,
    );
    require_port(&format!("{}.ecs.container_port", path), ecs.container_port, problems);
    require_port(&format!("{}.ecs.host_port", path), ecs.host_port, problems);
    // awsvpc networking requires host and container ports to match
    if ecs.host_port != ecs.container_port {
        problems.push(format!(
            "{}.ecs: host_port {} must equal container_port {} with awsvpc networking",
            path, ecs.host_port, ecs.container_port
        ));
    }

    match fargate_memory_options(ecs.td_cpu) {
        None => problems.push(format!(
            "{}.ecs.td_cpu: {} is not a Fargate cpu size (256, 512, 1024, 2048, 4096, 8192, 16384)",
            path, ecs.td_cpu
        )),
        Some(options) if !options.contains(&ecs.td_memory) => problems.push(format!(
            "{}.ecs.td_memory: {} MiB is not valid with {} cpu units",
            path, ecs.td_memory, ecs.td_cpu
        )),
        Some(_) => {}
    }
    if ecs.container_cpu > ecs.td_cpu {
        problems.push(format!(
            "{}.ecs.container_cpu: {} exceeds the task cpu {}",
            path, ecs.container_cpu, ecs.td_cpu
        ));
    }
    if ecs.container_memory == 0 || ecs.container_memory > ecs.td_memory {
        problems.push(format!(
            "{}.ecs.container_memory: {} must be between 1 and the task memory {}",
            path, ecs.container_memory, ecs.td_memory
        ));
    }

    require_port(&format!("{}.lb.targer_port", path), app.lb.target_port, problems);
    require_match(
        &format!("{}.lb.certificate_arn", path),
        &app.lb.certificate_arn,
        &ACM_CERTIFICATE_ARN,
        "an ACM certificate ARN",
        problems,
    );

    if let Some(arn) = &app.build.base_image_repository_arn {
        require_match(
            &format!("{}.build.base_image_repository_arn", path),
            arn,
            &ECR_REPOSITORY_ARN,
            "an ECR repository ARN",
            problems,
        );
    }
    if let Some(arn) = &app.build.source_bucket_arn {
        require_match(
            &format!("{}.build.source_bucket_arn", path),
            arn,
            &S3_BUCKET_ARN,
            "an S3 bucket ARN",
            problems,
        );
    }
}

/// Checks that depend on both the account and the app
fn check_app_in_account(
    path: &str,
    account: &AccountConfig,
    app: &FrontendAppConfig,
    problems: &mut Vec<String>,
) {
    let zones = app.ecs.zones_for(&account.region);
    let matching = account
        .resources
        .subnets
        .iter()
        .filter(|s| zones.contains(&s.availability_zone))
        .count();
    if !account.resources.subnets.is_empty() && matching == 0 {
        problems.push(format!(
            "{}: no subnet of account {} lies in zones [{}]",
            path,
            account.account_id,
            zones.join(", ")
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::{sample_config, SAMPLE_CONFIG};
    use crate::error::ConfigError;

    fn problems_for(yaml: &str) -> Vec<String> {
        match AppConfig::from_yaml_str(yaml, "test") {
            Ok(_) => Vec::new(),
            Err(ConfigError::Invalid(problems)) => problems,
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_sample_config_is_valid() {
        assert!(collect_problems(&sample_config()).is_empty());
    }

    #[test]
    fn test_fargate_sizes() {
        assert!(fargate_memory_options(256).unwrap().contains(&512));
        assert!(!fargate_memory_options(256).unwrap().contains(&4096));
        assert!(fargate_memory_options(4096).unwrap().contains(&30720));
        assert!(fargate_memory_options(300).is_none());
    }

    #[test]
    fn test_invalid_task_memory() {
        let problems = problems_for(&SAMPLE_CONFIG.replace("td_memory: 1024", "td_memory: 768"));
        assert_eq!(problems.len(), 1, "{:?}", problems);
        assert!(problems[0].contains("td_memory: 768 MiB"));
    }

    #[test]
    fn test_reports_every_problem() {
        let yaml = SAMPLE_CONFIG
            .replace("accountId: \"111111111111\"", "accountId: \"1234\"")
            .replace("region: eu-central-1\n    env", "region: frankfurt\n    env")
            .replace(
                "certificate_arn: arn:aws:acm:eu-central-1:111111111111:certificate/abc-123",
                "certificate_arn: not-an-arn",
            );
        let problems = problems_for(&yaml);
        assert!(problems.iter().any(|p| p.contains("aws_vars.dev.accountId")));
        assert!(problems.iter().any(|p| p.contains("aws_vars.dev.region")));
        assert!(problems.iter().any(|p| p.contains("lb.certificate_arn")));
    }

    #[test]
    fn test_port_mismatch() {
        let problems = problems_for(&SAMPLE_CONFIG.replace("host_port: 2368", "host_port: 80"));
        assert!(problems.iter().any(|p| p.contains("host_port 80")));
    }

    #[test]
    fn test_no_subnet_in_zones() {
        let yaml = SAMPLE_CONFIG.replace(
            "      cluster_name: ghost-cluster\n",
            "      cluster_name: ghost-cluster\n      availability_zones: [ap-south-1a]\n",
        );
        let problems = problems_for(&yaml);
        assert_eq!(problems.len(), 1, "{:?}", problems);
        assert!(problems[0].contains("ap-south-1a"));
    }

    #[test]
    fn test_optional_build_arns() {
        let yaml = SAMPLE_CONFIG.replace(
            "    lb:\n",
            "    build:\n      base_image_repository_arn: arn:aws:ecr:eu-central-1:333333333333:repository/ghost\n      source_bucket_arn: not-a-bucket\n    lb:\n",
        );
        let problems = problems_for(&yaml);
        assert_eq!(problems.len(), 1, "{:?}", problems);
        assert!(problems[0].contains("source_bucket_arn"));
    }

    #[test]
    fn test_empty_accounts() {
        let apps = SAMPLE_CONFIG.split("frontend-ghost-app:").nth(1).unwrap();
        let yaml = format!("aws_vars: {{}}\nfrontend-ghost-app:{}", apps);
        assert_eq!(
            problems_for(&yaml),
            vec!["aws_vars: at least one account is required".to_string()]
        );
    }

    #[test]
    fn test_empty_apps() {
        let accounts = SAMPLE_CONFIG.split("frontend-ghost-app:").next().unwrap();
        let yaml = format!("{}frontend-ghost-app: {{}}\n", accounts);
        assert_eq!(
            problems_for(&yaml),
            vec!["frontend-ghost-app: at least one app is required".to_string()]
        );
    }

    #[test]
    fn test_listener_port_out_of_range() {
        for port in ["0", "70000"] {
            let yaml = SAMPLE_CONFIG.replace("targer_port: 443", &format!("targer_port: {}", port));
            let problems = problems_for(&yaml);
            assert_eq!(problems.len(), 1, "{:?}", problems);
            assert_eq!(
                problems[0],
                format!("frontend-ghost-app.blog.lb.targer_port: port {} is outside 1-65535", port)
            );
        }
    }

    #[test]
    fn test_cross_account_role_must_be_role_arn() {
        let yaml = SAMPLE_CONFIG.replace(
            "crossAccountRole: arn:aws:iam::222222222222:role/codecommit-cross-account",
            "crossAccountRole: arn:aws:iam::222222222222:user/codecommit",
        );
        let problems = problems_for(&yaml);
        assert_eq!(problems.len(), 1, "{:?}", problems);
        assert!(problems[0].starts_with("aws_vars.dev.service_account.crossAccountRole:"));
        assert!(problems[0].ends_with("is not an IAM role ARN"));
    }

    #[test]
    fn test_required_strings_must_not_be_empty() {
        let yaml = SAMPLE_CONFIG
            .replace("client: acme", "client: \"\"")
            .replace("sourceBranch: main", "sourceBranch: \"  \"");
        let problems = problems_for(&yaml);
        assert!(problems.contains(&"aws_vars.dev.project.client: must not be empty".to_string()));
        assert!(problems
            .contains(&"frontend-ghost-app.blog.code.sourceBranch: must not be empty".to_string()));
    }

    #[test]
    fn test_container_cpu_exceeds_task() {
        let problems = problems_for(&SAMPLE_CONFIG.replace("container_cpu: 256", "container_cpu: 1024"));
        assert_eq!(
            problems,
            vec!["frontend-ghost-app.blog.ecs.container_cpu: 1024 exceeds the task cpu 512".to_string()]
        );
    }
}
