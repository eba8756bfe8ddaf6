//! Shared User-Agent strings for fetcher and download HTTP clients.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/tharunbirla/FetchIt";

/// Desktop browser User-Agent sent to pages that block non-browser clients.
pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/89.0.4389.114 Safari/537.36";

/// Default User-Agent for resolver and download requests.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("fetchit/{version} (+{PROJECT_UA_URL})")
}
