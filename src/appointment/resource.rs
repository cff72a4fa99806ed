use super::config::SourceConfig;
use anyhow::{anyhow, bail, Context, Result};
use reqwest::blocking::Client;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

/// Outcome of a status-change request. `body` carries the server's error
/// payload when the request was rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusResponse {
    pub ok: bool,
    pub status: u16,
    pub body: Option<Value>,
}

/// Remote side of the appointment widget. Implementations block; callers
/// run them off the UI thread.
pub trait AppointmentResource: Send + Sync {
    fn get_appointments(&self, source: &SourceConfig, provider: Option<&Value>)
        -> Result<Vec<Value>>;

    fn change_appointment_status(
        &self,
        uuid: &str,
        to_status: &str,
        base_url: &str,
    ) -> Result<StatusResponse>;
}

pub struct HttpAppointmentResource {
    client: Client,
}

impl HttpAppointmentResource {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("clinic-dashboard appointments")
            .build()?;
        Ok(Self { client })
    }
}

impl AppointmentResource for HttpAppointmentResource {
    fn get_appointments(
        &self,
        source: &SourceConfig,
        provider: Option<&Value>,
    ) -> Result<Vec<Value>> {
        let mut req = self.client.get(&source.url);
        if let Some(uuid) = provider.and_then(provider_uuid) {
            req = req.query(&[("provider", uuid)]);
        }
        let resp = req
            .send()
            .with_context(|| format!("fetch appointments from {}", source.url))?;
        if !resp.status().is_success() {
            bail!("http status {}", resp.status());
        }
        let body: Value = resp.json().context("decode appointments")?;
        appointments_from_body(body)
    }

    fn change_appointment_status(
        &self,
        uuid: &str,
        to_status: &str,
        base_url: &str,
    ) -> Result<StatusResponse> {
        let url = status_change_url(base_url, uuid)?;
        let resp = self
            .client
            .post(url.clone())
            .json(&json!({ "toStatus": to_status }))
            .send()
            .with_context(|| format!("change status of {uuid} via {url}"))?;
        let status = resp.status();
        let body = if status.is_success() {
            None
        } else {
            let text = resp.text().unwrap_or_default();
            Some(serde_json::from_str(&text).unwrap_or(Value::String(text)))
        };
        Ok(StatusResponse {
            ok: status.is_success(),
            status: status.as_u16(),
            body,
        })
    }
}

/// Accept either a bare JSON array or an object wrapping it in `data`.
fn appointments_from_body(body: Value) -> Result<Vec<Value>> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => Ok(items),
            _ => bail!("appointments response has no data array"),
        },
        other => bail!("unexpected appointments response: {other}"),
    }
}

fn provider_uuid(provider: &Value) -> Option<&str> {
    match provider {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get("uuid").and_then(Value::as_str),
        _ => None,
    }
}

/// `{base_url}/{uuid}/status-change`, dropping any query on the base URL.
pub fn status_change_url(base_url: &str, uuid: &str) -> Result<Url> {
    let mut url = Url::parse(base_url).with_context(|| format!("invalid base url {base_url}"))?;
    url.set_query(None);
    url.path_segments_mut()
        .map_err(|_| anyhow!("base url {base_url} cannot have a path"))?
        .pop_if_empty()
        .push(uuid)
        .push("status-change");
    Ok(url)
}
