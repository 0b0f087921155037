//! Request validation for the subscription surface.

use url::Url;

use crate::error::WebhookError;

/// Maximum length for an event type name.
const MAX_EVENT_TYPE_LEN: usize = 128;

/// Validate a subscriber target URL: must parse, use http(s) and name a host.
pub fn validate_target_url(raw: &str) -> Result<(), WebhookError> {
    let parsed =
        Url::parse(raw).map_err(|e| WebhookError::InvalidTargetUrl(format!("{raw}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(WebhookError::InvalidTargetUrl(format!(
                "unsupported scheme '{other}'"
            )))
        }
    }

    if parsed.host_str().is_none() {
        return Err(WebhookError::InvalidTargetUrl("missing host".to_string()));
    }

    Ok(())
}

/// Validate an event type name, e.g. `order.created`.
pub fn validate_event_type(event_type: &str) -> Result<(), WebhookError> {
    if event_type.is_empty() {
        return Err(WebhookError::Validation(
            "event type must not be empty".to_string(),
        ));
    }

    if event_type.len() > MAX_EVENT_TYPE_LEN {
        return Err(WebhookError::Validation(format!(
            "event type exceeds {MAX_EVENT_TYPE_LEN} characters"
        )));
    }

    let valid = event_type
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if !valid {
        return Err(WebhookError::Validation(format!(
            "event type '{event_type}' contains invalid characters"
        )));
    }

    Ok(())
}
