use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// A described task, reduced to what the inventory needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDetail {
    pub task_arn: String,
    /// `None` when the provider omits it (should not happen for running tasks)
    pub task_definition_arn: Option<String>,
}

/// A container definition from a task definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    /// Image reference, e.g. "123.dkr.ecr.us-west-2.amazonaws.com/svc:v1"
    pub image: Option<String>,
}

/// What to do with a running container whose image reference carries no tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingTagPolicy {
    /// Contribute nothing to the active set
    #[default]
    Skip,
    /// Fail the whole inventory pass
    Fail,
}

impl fmt::Display for MissingTagPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingTagPolicy::Skip => write!(f, "skip"),
            MissingTagPolicy::Fail => write!(f, "fail"),
        }
    }
}

impl FromStr for MissingTagPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skip" => Ok(MissingTagPolicy::Skip),
            "fail" => Ok(MissingTagPolicy::Fail),
            _ => Err(anyhow::anyhow!(
                "Invalid missing tag policy: '{}'. Must be 'skip' or 'fail'",
                s
            )),
        }
    }
}

/// Extract the tag from an image reference
///
/// The tag is whatever follows the last `:` of the final path segment, with any
/// `@digest` suffix removed first. `host:5000/app` and `app@sha256:...` have no tag.
pub fn parse_image_tag(image: &str) -> Option<&str> {
    let name = image.split_once('@').map_or(image, |(name, _)| name);
    let last_segment = name.rsplit_once('/').map_or(name, |(_, segment)| segment);

    match last_segment.rsplit_once(':') {
        Some((_, tag)) if !tag.is_empty() => Some(tag),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_tag() {
        assert_eq!(parse_image_tag("svc:v1"), Some("v1"));
        assert_eq!(parse_image_tag("nginx:latest"), Some("latest"));
    }

    #[test]
    fn test_parse_ecr_reference() {
        assert_eq!(
            parse_image_tag("123456789012.dkr.ecr.us-west-2.amazonaws.com/team/svc:abc123"),
            Some("abc123")
        );
    }

    #[test]
    fn test_parse_no_tag() {
        assert_eq!(parse_image_tag("svc"), None);
        assert_eq!(parse_image_tag("team/svc"), None);
        assert_eq!(parse_image_tag("svc:"), None);
        assert_eq!(parse_image_tag(""), None);
    }

    #[test]
    fn test_parse_registry_port_is_not_a_tag() {
        assert_eq!(parse_image_tag("localhost:5000/svc"), None);
        assert_eq!(parse_image_tag("localhost:5000/svc:v2"), Some("v2"));
    }

    #[test]
    fn test_parse_digest_pinned() {
        assert_eq!(parse_image_tag("svc@sha256:deadbeef"), None);
        assert_eq!(parse_image_tag("svc:v3@sha256:deadbeef"), Some("v3"));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("skip".parse::<MissingTagPolicy>().unwrap(), MissingTagPolicy::Skip);
        assert_eq!("fail".parse::<MissingTagPolicy>().unwrap(), MissingTagPolicy::Fail);
        assert!("ignore".parse::<MissingTagPolicy>().is_err());
    }
}
