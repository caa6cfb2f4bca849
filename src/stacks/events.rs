use crate::config::{AccountConfig, FrontendAppConfig};
use crate::names;
use serde_json::{json, Value};

pub const CODECOMMIT_SOURCE: &str = "aws.codecommit";
pub const CODECOMMIT_STATE_CHANGE: &str = "CodeCommit Repository State Change";

/// EventBridge pattern matching creation of, or pushes to, the configured
/// branch of the app's repository in the service account
pub fn codecommit_branch_pattern(account: &AccountConfig, app: &FrontendAppConfig) -> Value {
    json!({
        "account": [account.service_account.account_id],
        "source": [CODECOMMIT_SOURCE],
        "resources": [names::codecommit_repository_arn(account, app)],
        "detail-type": [CODECOMMIT_STATE_CHANGE],
        "detail": {
            "referenceType": ["branch"],
            "event": ["referenceCreated", "referenceUpdated"],
            "referenceName": [app.code.source_branch],
        },
    })
}
