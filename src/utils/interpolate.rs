use crate::errors::ToolError;
use crate::utils::scalar_to_string;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(\w+)\}").expect("placeholder regex"));

/// Substitutes every `{name}` placeholder with the percent-encoded string
/// form of the matching parameter. A placeholder whose key is absent (or
/// explicitly null) fails with `MISSING_PARAMETER` naming the key; values
/// containing reserved URL characters never split the path.
pub fn interpolate_path(template: &str, params: &Map<String, Value>) -> Result<String, ToolError> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(template) {
        let whole = caps.get(0).expect("capture 0 always present");
        let key = &caps[1];
        let value = params
            .get(key)
            .filter(|value| !value.is_null())
            .ok_or_else(|| ToolError::missing_parameter(key))?;
        out.push_str(&template[last..whole.start()]);
        out.push_str(&urlencoding::encode(&scalar_to_string(value)));
        last = whole.end();
    }
    out.push_str(&template[last..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn replaces_all_placeholders() {
        let out = interpolate_path(
            "/endpoints/managed/{orgId}/{endpointId}",
            &params(&[("orgId", json!(7)), ("endpointId", json!("abc"))]),
        )
        .unwrap();
        assert_eq!(out, "/endpoints/managed/7/abc");
        assert!(!out.contains('{'));
    }

    #[test]
    fn missing_key_names_the_parameter() {
        let err = interpolate_path("/search/{orgId}", &params(&[])).unwrap_err();
        assert_eq!(err.code, "MISSING_PARAMETER");
        assert!(err.message.contains("orgId"));
    }

    #[test]
    fn null_value_counts_as_missing() {
        let err =
            interpolate_path("/search/{orgId}", &params(&[("orgId", Value::Null)])).unwrap_err();
        assert_eq!(err.code, "MISSING_PARAMETER");
    }

    #[test]
    fn reserved_characters_are_percent_encoded() {
        let out = interpolate_path(
            "/groups/{groupId}",
            &params(&[("groupId", json!("a/b c"))]),
        )
        .unwrap();
        assert_eq!(out, "/groups/a%2Fb%20c");
        assert_eq!(
            urlencoding::decode("a%2Fb%20c").unwrap(),
            "a/b c",
            "encoding must round-trip"
        );
    }
}
