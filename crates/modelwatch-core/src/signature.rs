//! Canonical model signatures.
//!
//! A signature identifies one `(provider, model, auth profile)` tuple. Two
//! turns announce the same model exactly when their signatures are equal.

/// Label used when no auth profile is known.
pub const UNKNOWN_PROFILE: &str = "unknown";

fn profile_label(profile: Option<&str>) -> &str {
    profile.unwrap_or(UNKNOWN_PROFILE)
}

/// `"<provider>/<model_id>@<profile>"`.
pub fn signature(provider: &str, model_id: &str, profile: Option<&str>) -> String {
    format!("{}/{}@{}", provider, model_id, profile_label(profile))
}

/// Notification body for a detected switch.
pub fn switch_message(provider: &str, model_id: &str, profile: Option<&str>) -> String {
    format!(
        "Model switch -> {}/{} @ {}",
        provider,
        model_id,
        profile_label(profile)
    )
}
