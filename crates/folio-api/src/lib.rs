// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use folio_app::{
    CHAT_FAILED, ChartImage, ChartKind, ChatRequest, FlowError, PortfolioSnapshot, RowRecord,
    Totals, UPLOAD_FAILED,
};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use reqwest::blocking::multipart::Form;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use time::OffsetDateTime;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://ai-stock-analyzer-eo95.onrender.com";
pub const UPLOAD_PATH: &str = "/api/upload";
pub const CHAT_PATH: &str = "/api/chat";
pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Option<Duration>,
    http: HttpClient,
}

impl Client {
    /// Builds a client for the analysis service. `timeout: None` waits
    /// indefinitely for a response.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let base_url = validate_base_url(base_url)?;
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn upload_portfolio(&self, path: &Path) -> Result<PortfolioSnapshot, FlowError> {
        let form = Form::new().file(UPLOAD_FIELD, path).map_err(|error| {
            FlowError::Validation(format!("cannot read {}: {error}", path.display()))
        })?;

        let url = format!("{}{UPLOAD_PATH}", self.base_url);
        tracing::debug!(%url, file = %path.display(), "uploading portfolio");
        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .map_err(|error| connection_error(&self.base_url, &error))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|error| connection_error(&self.base_url, &error))?;
        decode_upload_response(status, &body)
    }

    pub fn ask(&self, request: &ChatRequest) -> Result<String, FlowError> {
        let url = format!("{}{CHAT_PATH}", self.base_url);
        tracing::debug!(%url, turns = request.chat_history.len(), "sending chat message");
        let response = self
            .http
            .post(url)
            .json(request)
            .send()
            .map_err(|error| connection_error(&self.base_url, &error))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|error| connection_error(&self.base_url, &error))?;
        decode_chat_response(status, &body)
    }
}

/// Checks that `raw` is an absolute http(s) URL and returns it without a
/// trailing slash.
pub fn validate_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        bail!("service.base_url must not be empty");
    }
    let parsed =
        Url::parse(trimmed).with_context(|| format!("service.base_url {trimmed:?} is not a URL"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!(
            "service.base_url must use http or https, got {:?} -- use e.g. {DEFAULT_BASE_URL}",
            parsed.scheme()
        );
    }
    if parsed.host_str().is_none() {
        bail!("service.base_url {trimmed:?} has no host");
    }
    Ok(trimmed.to_owned())
}

/// Interprets an `/api/upload` response. The body must be JSON whatever the
/// status; failures carry the body's `error` when it has one.
pub fn decode_upload_response(
    status: StatusCode,
    body: &str,
) -> Result<PortfolioSnapshot, FlowError> {
    let value = parse_body(body)?;
    if !status.is_success() {
        return Err(FlowError::server(error_message(&value), UPLOAD_FAILED));
    }
    if value.get("success").and_then(Value::as_bool) != Some(true) {
        return Err(FlowError::server(error_message(&value), UPLOAD_FAILED));
    }

    let envelope: UploadEnvelope = serde_json::from_value(value).map_err(|error| {
        tracing::warn!(%error, "upload response has unexpected shape");
        FlowError::InvalidResponse
    })?;
    Ok(envelope.into_snapshot(OffsetDateTime::now_utc()))
}

/// Interprets an `/api/chat` response and returns the assistant's reply.
pub fn decode_chat_response(status: StatusCode, body: &str) -> Result<String, FlowError> {
    let value = parse_body(body)?;
    if !status.is_success() {
        return Err(FlowError::server(error_message(&value), CHAT_FAILED));
    }
    match value.get("response").and_then(Value::as_str) {
        Some(reply) => Ok(reply.to_owned()),
        None => {
            tracing::warn!("chat response has no reply text");
            Err(FlowError::InvalidResponse)
        }
    }
}

fn parse_body(body: &str) -> Result<Value, FlowError> {
    serde_json::from_str(body).map_err(|error| {
        let preview = body.chars().take(120).collect::<String>();
        tracing::warn!(%error, body = %preview, "response body is not JSON");
        FlowError::InvalidResponse
    })
}

fn error_message(value: &Value) -> Option<&str> {
    value.get("error").and_then(Value::as_str)
}

fn connection_error(base_url: &str, error: &reqwest::Error) -> FlowError {
    if error.is_timeout() {
        return FlowError::Transport(format!("{base_url} did not respond in time"));
    }
    FlowError::Transport(format!("cannot reach {base_url} ({error})"))
}

#[derive(Debug, Default, Deserialize)]
struct UploadEnvelope {
    #[serde(default)]
    table_data: Option<Vec<RowRecord>>,
    #[serde(default)]
    pie_charts: Option<BTreeMap<String, Option<String>>>,
    #[serde(default)]
    totals: Option<Totals>,
    #[serde(default)]
    holdings: Option<Map<String, Value>>,
}

impl UploadEnvelope {
    fn into_snapshot(self, received_at: OffsetDateTime) -> PortfolioSnapshot {
        let charts = self
            .pie_charts
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(key, encoded)| {
                let kind = ChartKind::parse(&key)?;
                let encoded = encoded.filter(|encoded| !encoded.trim().is_empty())?;
                Some((kind, ChartImage::new(encoded)))
            })
            .collect();

        PortfolioSnapshot {
            table_rows: self.table_data.unwrap_or_default(),
            charts,
            totals: self.totals,
            holdings: self.holdings.unwrap_or_default(),
            received_at: Some(received_at),
        }
    }
}
