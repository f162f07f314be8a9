use std::env;
use std::time::Duration;

use anyhow::{bail, Result};
use reqwest::Url;
use serde::Deserialize;

const DEFAULT_URL: &str = "http://127.0.0.1:25566/health";

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
}

fn main() -> Result<()> {
    let url = env::args().nth(1).unwrap_or_else(|| DEFAULT_URL.to_string());
    let url = Url::parse(&url)?;

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;
    let response = client.get(url).send()?;
    if !response.status().is_success() {
        bail!("Health check failed with status {}", response.status())
    }

    let health: HealthResponse = response.json()?;
    if health.status != "ok" {
        bail!("Service reported status {}", health.status)
    }
    Ok(())
}
