use crate::constants::pagination;
use crate::endpoints::PaginationStyle;
use crate::errors::ToolError;
use crate::services::http::HttpService;
use crate::utils::items::extract_items;
use crate::utils::qs::qs;
use serde_json::{Map, Value};

/// Lazy, finite, forward-only batch sequence over one of the four pagination
/// styles. Each instance owns its own cursor state; call `next_batch` until
/// it returns `None`, or drain everything with `collect`.
pub struct Paginator<'a> {
    http: &'a HttpService,
    base_path: String,
    params: Map<String, Value>,
    state: State,
    done: bool,
}

#[derive(Debug, Clone)]
enum State {
    Single,
    Cursor { cursor: Option<String> },
    Page { page: u64, per_page: u64 },
    Link { next: Option<String>, first: bool },
}

impl<'a> Paginator<'a> {
    pub fn new(
        http: &'a HttpService,
        base_path: impl Into<String>,
        initial_params: Map<String, Value>,
    ) -> Self {
        let config = &http.spec().pagination;
        let state = match config.style {
            PaginationStyle::None => State::Single,
            PaginationStyle::Cursor => {
                let seed = config
                    .cursor_param
                    .as_deref()
                    .and_then(|param| initial_params.get(param))
                    .and_then(cursor_value);
                State::Cursor { cursor: seed }
            }
            PaginationStyle::Page => {
                let page_param = config.page_param.as_deref().unwrap_or("page");
                let per_page_param = config.per_page_param.as_deref().unwrap_or("per_page");
                let page = initial_params
                    .get(page_param)
                    .and_then(numeric)
                    .unwrap_or(pagination::DEFAULT_PAGE);
                let per_page = initial_params
                    .get(per_page_param)
                    .and_then(numeric)
                    .unwrap_or(pagination::DEFAULT_PAGE_SIZE);
                State::Page { page, per_page }
            }
            PaginationStyle::Link => State::Link {
                next: None,
                first: true,
            },
        };
        Self {
            http,
            base_path: base_path.into(),
            params: initial_params,
            state,
            done: false,
        }
    }

    pub async fn next_batch(&mut self) -> Result<Option<Vec<Value>>, ToolError> {
        if self.done {
            return Ok(None);
        }
        match self.state.clone() {
            State::Single => {
                self.done = true;
                let data = self.fetch(&self.params.clone()).await?;
                Ok(Some(extract_items(&data)))
            }
            State::Cursor { cursor } => {
                let config = &self.http.spec().pagination;
                let cursor_param = config
                    .cursor_param
                    .as_deref()
                    .unwrap_or("cursor")
                    .to_string();
                let mut params = self.params.clone();
                if let Some(cursor) = cursor.as_deref() {
                    params.insert(cursor_param.clone(), Value::String(cursor.to_string()));
                }
                let data = self.fetch(&params).await?;
                let items = extract_items(&data);
                match next_cursor(&data, Some(cursor_param.as_str())) {
                    Some(next) => self.state = State::Cursor { cursor: Some(next) },
                    None => self.done = true,
                }
                Ok(Some(items))
            }
            State::Page { page, per_page } => {
                let config = &self.http.spec().pagination;
                let page_param = config.page_param.as_deref().unwrap_or("page").to_string();
                let per_page_param = config
                    .per_page_param
                    .as_deref()
                    .unwrap_or("per_page")
                    .to_string();
                let mut params = self.params.clone();
                params.insert(page_param, Value::from(page));
                params.insert(per_page_param, Value::from(per_page));
                let data = self.fetch(&params).await?;
                let items = extract_items(&data);
                if items.is_empty() {
                    self.done = true;
                    return Ok(None);
                }
                if (items.len() as u64) < per_page {
                    self.done = true;
                } else {
                    self.state = State::Page {
                        page: page + 1,
                        per_page,
                    };
                }
                Ok(Some(items))
            }
            State::Link { next, first } => {
                let data = if first {
                    self.fetch(&self.params.clone()).await?
                } else if let Some(url) = next {
                    self.http.get_with_retry(&url).await?
                } else {
                    self.done = true;
                    return Ok(None);
                };
                let items = extract_items(&data);
                let configured = self
                    .http
                    .spec()
                    .pagination
                    .next_field
                    .as_deref()
                    .unwrap_or("next");
                let next = data
                    .get("next")
                    .and_then(|value| value.as_str())
                    .or_else(|| data.get(configured).and_then(|value| value.as_str()))
                    .map(str::to_string);
                if next.is_none() {
                    self.done = true;
                } else {
                    self.state = State::Link { next, first: false };
                }
                Ok(Some(items))
            }
        }
    }

    /// Drains the whole sequence into one flattened item list.
    pub async fn collect(mut self) -> Result<Vec<Value>, ToolError> {
        let mut all = Vec::new();
        while let Some(batch) = self.next_batch().await? {
            all.extend(batch);
        }
        Ok(all)
    }

    async fn fetch(&self, params: &Map<String, Value>) -> Result<Value, ToolError> {
        let query = qs(params);
        self.http
            .get_with_retry(&format!("{}{}", self.base_path, query))
            .await
    }
}

/// Next cursor from a response: the configured field first, then `nextPage`,
/// then `cursor`. Empty strings and zero mean "no more pages".
fn next_cursor(data: &Value, configured: Option<&str>) -> Option<String> {
    let mut fields: Vec<&str> = Vec::new();
    if let Some(configured) = configured {
        fields.push(configured);
    }
    fields.push("nextPage");
    fields.push("cursor");
    for field in fields {
        if let Some(next) = data.get(field).and_then(cursor_value) {
            return Some(next);
        }
    }
    None
}

fn cursor_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => {
            if number.as_i64() == Some(0) {
                None
            } else {
                Some(number.to_string())
            }
        }
        _ => None,
    }
}

fn numeric(value: &Value) -> Option<u64> {
    if let Some(number) = value.as_u64() {
        return Some(number);
    }
    value.as_str().and_then(|text| text.parse::<u64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn next_cursor_prefers_configured_field() {
        let data = json!({"next_page": "abc", "cursor": "zzz"});
        assert_eq!(next_cursor(&data, Some("next_page")), Some("abc".to_string()));
    }

    #[test]
    fn next_cursor_falls_back_across_fields() {
        assert_eq!(
            next_cursor(&json!({"nextPage": "p2"}), Some("next_page")),
            Some("p2".to_string())
        );
        assert_eq!(
            next_cursor(&json!({"cursor": 7}), Some("next_page")),
            Some("7".to_string())
        );
    }

    #[test]
    fn empty_and_null_cursors_terminate() {
        assert_eq!(next_cursor(&json!({"next_page": null}), Some("next_page")), None);
        assert_eq!(next_cursor(&json!({"next_page": ""}), Some("next_page")), None);
        assert_eq!(next_cursor(&json!({}), Some("next_page")), None);
    }
}
