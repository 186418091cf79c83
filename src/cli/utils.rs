use anyhow::{anyhow, Context};
use reqwest::{Client, Method};
use serde_json::{json, Value};
use url::Url;

use crate::cli::OutputFormat;

/// Thin HTTP client over the API. Base URL and token come from flags with
/// env fallbacks, so scripts can omit them.
pub struct ApiClient {
    base: Url,
    token: Option<String>,
    client: Client,
}

impl ApiClient {
    pub fn new(server: Option<String>, token: Option<String>) -> anyhow::Result<Self> {
        let raw = server
            .or_else(|| std::env::var("ATRIUM_SERVER_URL").ok())
            .unwrap_or_else(|| "http://localhost:3000".to_string());
        let base = Url::parse(&raw).with_context(|| format!("invalid server URL: {}", raw))?;
        let token = token.or_else(|| std::env::var("ATRIUM_TOKEN").ok());

        Ok(Self {
            base,
            token,
            client: Client::new(),
        })
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<Value> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> anyhow::Result<Value> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> anyhow::Result<Value> {
        self.request(Method::PUT, path, Some(body)).await
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> anyhow::Result<Value> {
        let url = self.base.join(path)?;
        let mut request = self.client.request(method, url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.context("request failed")?;
        let status = response.status();
        let payload: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let message = payload
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("request failed");
            return Err(anyhow!("{} ({})", message, status));
        }
        Ok(payload)
    }
}

/// Print a success envelope's data member in the requested format.
pub fn output_data(output_format: OutputFormat, payload: &Value) -> anyhow::Result<()> {
    let data = payload.get("data").unwrap_or(payload);
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
        OutputFormat::Text => print_text(data),
    }
    if let Some(warning) = payload.get("warning") {
        eprintln!("warning: {}", warning);
    }
    Ok(())
}

pub fn output_success(output_format: OutputFormat, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "success": true, "message": message }))?
        ),
        OutputFormat::Text => println!("{}", message),
    }
    Ok(())
}

fn print_text(data: &Value) {
    match data {
        Value::Array(items) => {
            for item in items {
                print_text(item);
            }
        }
        Value::Object(map) => {
            let line = map
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(" ");
            println!("{}", line);
        }
        other => println!("{}", other),
    }
}
