use sha2::{Digest, Sha256};

const MAX_HUMAN_LENGTH: usize = 240;
const HASH_LENGTH: usize = 8;

/// Stable logical ID for a construct path.
///
/// The readable part is the alphanumeric characters of each path component;
/// the suffix is the first 8 hex digits of a SHA-256 over the full path, so
/// paths that sanitize to the same text still get distinct IDs. The same
/// path always yields the same ID, which keeps CloudFormation from replacing
/// resources between deployments.
pub fn logical_id(path: &[&str]) -> String {
    let mut human: String = path
        .iter()
        .flat_map(|component| component.chars().filter(|c| c.is_ascii_alphanumeric()))
        .collect();
    human.truncate(MAX_HUMAN_LENGTH);

    let digest = Sha256::digest(path.join("/").as_bytes());
    let hash = format!("{:X}", digest);

    format!("{}{}", human, &hash[..HASH_LENGTH])
}
