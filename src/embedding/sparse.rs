//! Sparse term-expansion client.
//!
//! Talks to a small inference sidecar that maps each text to a bag of
//! weighted terms (the text's own salient terms plus related vocabulary).
//! Overlap between a query's expansion and a chunk's stored expansion is
//! the sparse retrieval signal.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::ExpanderConfig;

/// Term → weight map produced by the expansion model.
pub type SparseExpansion = HashMap<String, f32>;

#[derive(Serialize)]
struct ExpandRequest<'a> {
    model: &'a str,
    texts: &'a [String],
}

#[derive(Deserialize)]
struct ExpandResponse {
    expansions: Vec<HashMap<String, f32>>,
}

/// Expand a batch of texts into weighted term maps. The result is parallel
/// with `texts`; a count mismatch from the sidecar is an error.
pub async fn expand_batch(
    client: &reqwest::Client,
    config: &ExpanderConfig,
    texts: &[String],
) -> Result<Vec<SparseExpansion>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let base_url = config
        .base_url
        .as_deref()
        .context("Expansion sidecar is not configured")?;
    let url = format!("{}/api/expand", base_url.trim_end_matches('/'));

    let req = ExpandRequest {
        model: &config.model,
        texts,
    };

    let resp = client
        .post(&url)
        .timeout(Duration::from_secs(config.timeout_secs))
        .json(&req)
        .send()
        .await
        .context("Failed to call expansion API")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Expansion API returned {status}: {body}");
    }

    let body: ExpandResponse = resp
        .json()
        .await
        .context("Failed to parse expansion response")?;

    if body.expansions.len() != texts.len() {
        anyhow::bail!(
            "Expansion API returned {} maps for {} inputs",
            body.expansions.len(),
            texts.len()
        );
    }

    Ok(body.expansions.into_iter().map(sanitize).collect())
}

/// Drop non-finite and non-positive weights. Zero or negative terms carry
/// no signal and would only distort overlap scores.
fn sanitize(expansion: HashMap<String, f32>) -> SparseExpansion {
    expansion
        .into_iter()
        .filter(|(_, w)| w.is_finite() && *w > 0.0)
        .collect()
}
