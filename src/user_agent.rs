//! User-Agent string shared by every HTTP client of the tool.

/// Project identifier appended to the User-Agent.
const PROJECT_UA_TAG: &str = "mwa-voltage-archive-client";

/// Default User-Agent for archive requests (identifies the tool and version).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("voltdownload/{version} ({PROJECT_UA_TAG})")
}
