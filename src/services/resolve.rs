use crate::errors::ToolError;
use crate::services::http::HttpService;
use crate::utils::interpolate::interpolate_path;
use crate::utils::items::{extract_items, pick};
use crate::utils::scalar_to_string;
use serde::Serialize;
use serde_json::{Map, Value};

/// Human-supplied filters to turn into canonical identifiers. Names and
/// labels match as case-insensitive substrings, emails as case-insensitive
/// exact values. An item must match at least one *requested* filter class.
#[derive(Debug, Clone, Default)]
pub struct ResolveQuery {
    pub resource: String,
    pub org_id: Option<Value>,
    pub names: Vec<String>,
    pub emails: Vec<String>,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedEntity {
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub raw: Value,
}

/// Lists the resource (first page only) and filters client-side. Fails
/// before any network call when the resource is not listable or a required
/// organization id is missing.
pub async fn resolve_to_ids(
    http: &HttpService,
    query: &ResolveQuery,
) -> Result<Vec<ResolvedEntity>, ToolError> {
    let descriptor = http.spec().resource(&query.resource).ok_or_else(|| {
        ToolError::resolution(format!(
            "Resource \"{}\" does not support listing for resolution",
            query.resource
        ))
    })?;
    let list = descriptor.list.as_ref().ok_or_else(|| {
        ToolError::resolution(format!(
            "Resource \"{}\" does not support listing for resolution",
            query.resource
        ))
    })?;

    let mut path = list.path.clone();
    if path.contains("{orgId}") {
        let org = query.org_id.clone().ok_or_else(|| {
            ToolError::resolution(format!(
                "Resource \"{}\" requires orgId to resolve",
                query.resource
            ))
        })?;
        let mut params = Map::new();
        params.insert("orgId".to_string(), org);
        path = interpolate_path(&path, &params)?;
    }

    let data = http.get_with_retry(&path).await?;
    let items = extract_items(&data);
    Ok(items
        .iter()
        .filter(|item| entity_matches(item, query))
        .map(|item| ResolvedEntity {
            id: pick(item, &["id", "endpointId", "groupId", "uuid"])
                .cloned()
                .unwrap_or(Value::Null),
            name: pick(item, &["name", "displayName", "hostname"]).map(scalar_to_string),
            email: pick(item, &["email", "userEmail"]).map(scalar_to_string),
            raw: (*item).clone(),
        })
        .collect())
}

fn field_text(item: &Value, keys: &[&str]) -> String {
    pick(item, keys)
        .map(scalar_to_string)
        .unwrap_or_default()
        .to_lowercase()
}

fn entity_matches(item: &Value, query: &ResolveQuery) -> bool {
    let name = field_text(item, &["name", "displayName", "hostname", "id"]);
    let email = field_text(item, &["email", "userEmail"]);
    let label = field_text(item, &["label", "title"]);

    let name_hit = !query.names.is_empty()
        && query
            .names
            .iter()
            .any(|wanted| name.contains(&wanted.to_lowercase()));
    let email_hit = !query.emails.is_empty()
        && query
            .emails
            .iter()
            .any(|wanted| email == wanted.to_lowercase());
    let label_hit = !query.labels.is_empty()
        && query
            .labels
            .iter()
            .any(|wanted| label.contains(&wanted.to_lowercase()));

    name_hit || email_hit || label_hit
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query(names: &[&str], emails: &[&str], labels: &[&str]) -> ResolveQuery {
        ResolveQuery {
            resource: "endpoints".to_string(),
            org_id: None,
            names: names.iter().map(|s| s.to_string()).collect(),
            emails: emails.iter().map(|s| s.to_string()).collect(),
            labels: labels.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn name_filter_is_case_insensitive_substring() {
        let alpha = json!({"id": "1", "name": "Alpha"});
        let beta = json!({"id": "2", "name": "Beta"});
        let q = query(&["alp"], &[], &[]);
        assert!(entity_matches(&alpha, &q));
        assert!(!entity_matches(&beta, &q));
    }

    #[test]
    fn email_filter_is_exact_match() {
        let item = json!({"id": "1", "email": "Ops@Example.com"});
        assert!(entity_matches(&item, &query(&[], &["ops@example.com"], &[])));
        assert!(!entity_matches(&item, &query(&[], &["ops@example"], &[])));
    }

    #[test]
    fn unrequested_filter_classes_never_match() {
        // The name would match, but only an email filter was requested.
        let item = json!({"id": "1", "name": "Alpha"});
        assert!(!entity_matches(&item, &query(&[], &["alpha@example.com"], &[])));
    }

    #[test]
    fn display_name_and_hostname_are_name_fallbacks() {
        let by_display = json!({"id": "1", "displayName": "Edge-01"});
        let by_host = json!({"id": "2", "hostname": "edge-02.local"});
        assert!(entity_matches(&by_display, &query(&["edge-01"], &[], &[])));
        assert!(entity_matches(&by_host, &query(&["edge-02"], &[], &[])));
    }

    #[test]
    fn label_filter_checks_label_then_title() {
        let item = json!({"id": "1", "title": "Staging fleet"});
        assert!(entity_matches(&item, &query(&[], &[], &["staging"])));
    }
}
