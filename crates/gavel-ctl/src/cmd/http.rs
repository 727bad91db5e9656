//! Shared HTTP request helpers for CLI commands.

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};

pub fn base_url(port: u16) -> String {
    format!("http://127.0.0.1:{}/api", port)
}

/// URL of one auction's action, e.g. `/api/auctions/<item>/bid`.
/// The item id is pushed as a single percent-encoded path segment.
pub fn auction_url(port: u16, item_id: &str, action: &str) -> Result<reqwest::Url> {
    let mut url = reqwest::Url::parse(&format!("{}/auctions", base_url(port)))
        .context("invalid API base url")?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("API base url cannot carry a path"))?
        .push(item_id)
        .push(action);
    Ok(url)
}

/// Decode a JSON body, or surface the daemon's error text.
async fn read_json<T: for<'de> Deserialize<'de>>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        bail!("{} ({})", text, status);
    }
    resp.json::<T>().await.context("failed to parse response")
}

pub async fn get_json<T: for<'de> Deserialize<'de>>(url: &str) -> Result<T> {
    let resp = reqwest::get(url)
        .await
        .with_context(|| format!("failed to connect to gaveld at {}, is it running?", url))?;
    read_json(resp).await
}

pub async fn post_json<T: for<'de> Deserialize<'de>>(url: &str) -> Result<T> {
    let resp = reqwest::Client::new()
        .post(url)
        .send()
        .await
        .with_context(|| format!("failed to connect to gaveld at {}, is it running?", url))?;
    read_json(resp).await
}

pub async fn post_json_body<T, R>(url: &str, body: &T) -> Result<R>
where
    T: Serialize,
    R: for<'de> Deserialize<'de>,
{
    let resp = reqwest::Client::new()
        .post(url)
        .json(body)
        .send()
        .await
        .with_context(|| format!("failed to connect to gaveld at {}, is it running?", url))?;
    read_json(resp).await
}
