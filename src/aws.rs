use aws_config::{BehaviorVersion, SdkConfig};

use crate::settings::AwsSettings;

/// Extract a clean error message from an AWS SDK error's Debug output
///
/// The AWS SDK errors have verbose Debug output, but we can extract just the
/// meaningful message by parsing for the `message: Some("...")` pattern.
pub fn format_sdk_error<E: std::fmt::Debug>(err: &E) -> String {
    let debug_str = format!("{:?}", err);

    // Pattern: message: Some("actual error message")
    if let Some(start) = debug_str.find("message: Some(\"") {
        let start = start + 15; // length of 'message: Some("'
        if let Some(end) = debug_str[start..].find("\")") {
            return debug_str[start..start + end].to_string();
        }
    }

    // Fallback: a Message field from the raw JSON response
    if let Some(start) = debug_str.find("\"Message\":\"") {
        let start = start + 11; // length of '"Message":"'
        if let Some(end) = debug_str[start..].find('"') {
            return debug_str[start..start + end].to_string();
        }
    }

    if debug_str.len() > 200 {
        let mut cut = 200;
        while !debug_str.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}...", &debug_str[..cut])
    } else {
        debug_str
    }
}

/// Load the shared SDK config for the configured region
///
/// Static credentials are used when both keys are set, otherwise the default
/// credential chain (env vars, profile, instance role).
pub async fn load_sdk_config(settings: &AwsSettings) -> SdkConfig {
    let loader = aws_config::defaults(BehaviorVersion::latest())
        .region(aws_config::Region::new(settings.region.clone()));

    if let (Some(access_key), Some(secret_key)) =
        (&settings.access_key_id, &settings.secret_access_key)
    {
        let creds = aws_sdk_ecr::config::Credentials::new(
            access_key.clone(),
            secret_key.clone(),
            None,
            None,
            "static",
        );
        loader.credentials_provider(creds).load().await
    } else {
        loader.load().await
    }
}
