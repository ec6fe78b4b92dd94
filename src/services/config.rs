use crate::constants::protocols::ALLOWED_SCHEMES;
use url::Url;

pub const ENV_API_BASE: &str = "API_BASE";
pub const ENV_API_KEY: &str = "API_KEY";
pub const ENV_BASIC_USER: &str = "BASIC_USER";
pub const ENV_BASIC_PASS: &str = "BASIC_PASS";
pub const ENV_CLIENT_ID: &str = "API_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "API_CLIENT_SECRET";
pub const ENV_ORG_ID: &str = "ORG_ID";
pub const ENV_ALLOW_DESTRUCTIVE: &str = "ALLOW_DESTRUCTIVE";

/// Static bearer token variables, highest priority first.
pub const TOKEN_ENV_VARS: &[&str] = &["BEARER_TOKEN", "API_TOKEN", "ACTION1_TOKEN"];

fn non_blank(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Base URL override; must parse as an http(s) URL. Trailing slashes are
/// stripped so path concatenation stays predictable.
pub fn base_url_override() -> Option<String> {
    let raw = non_blank(ENV_API_BASE)?;
    let parsed = Url::parse(&raw).ok()?;
    if !ALLOWED_SCHEMES.contains(&parsed.scheme()) {
        return None;
    }
    Some(raw.trim_end_matches('/').to_string())
}

/// Explicit bearer token plus the variable it came from.
pub fn static_token() -> Option<(String, &'static str)> {
    for key in TOKEN_ENV_VARS {
        if let Some(token) = non_blank(key) {
            return Some((token, key));
        }
    }
    None
}

pub fn client_credentials() -> Option<(String, String)> {
    Some((non_blank(ENV_CLIENT_ID)?, non_blank(ENV_CLIENT_SECRET)?))
}

pub fn api_key() -> Option<String> {
    non_blank(ENV_API_KEY)
}

pub fn basic_credentials() -> Option<(String, String)> {
    Some((non_blank(ENV_BASIC_USER)?, non_blank(ENV_BASIC_PASS)?))
}

pub fn default_org_id() -> Option<String> {
    non_blank(ENV_ORG_ID)
}

pub fn destructive_enabled() -> bool {
    non_blank(ENV_ALLOW_DESTRUCTIVE).as_deref() == Some("true")
}
