use crate::constants::poll;
use crate::errors::ToolError;
use crate::services::http::HttpService;
use crate::utils::interpolate::interpolate_path;
use serde_json::{Map, Value};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    pub interval_ms: u64,
    pub timeout_ms: u64,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval_ms: poll::INTERVAL_MS,
            timeout_ms: poll::TIMEOUT_MS,
        }
    }
}

/// Polls the configured job-status endpoint until a terminal status or the
/// deadline. The deadline is only checked between iterations; terminal
/// failures and timeouts carry the last observed payload for diagnostics.
pub async fn poll_job(
    http: &HttpService,
    job_params: &Map<String, Value>,
    opts: PollOptions,
) -> Result<Value, ToolError> {
    let config = http.spec().job_status.clone().ok_or_else(|| {
        ToolError::invalid_params("Job polling is not configured for this API")
    })?;
    let started = Instant::now();

    loop {
        let path = interpolate_path(&config.path_template, job_params)?;
        let data = http.get_with_retry(&path).await?;
        let status = data
            .get(&config.status_field)
            .and_then(|value| value.as_str())
            .unwrap_or("")
            .to_string();
        let label = config
            .label_field
            .as_deref()
            .and_then(|field| data.get(field))
            .cloned()
            .unwrap_or(Value::Null);

        if config.success_values.iter().any(|value| *value == status) {
            return Ok(serde_json::json!({
                "status": status,
                "label": label,
                "data": data,
            }));
        }
        if config.failure_values.iter().any(|value| *value == status) {
            return Err(ToolError::poll_failure(&status, data));
        }
        if started.elapsed().as_millis() as u64 > opts.timeout_ms {
            return Err(ToolError::poll_timeout(data));
        }
        tokio::time::sleep(Duration::from_millis(opts.interval_ms)).await;
    }
}
