//! `GET /api/version`: which version each node reports.

use std::collections::BTreeMap;

use serde::Deserialize;
use url::Url;

use crate::error::Result;
use crate::transport::Transport;

#[derive(Debug, Deserialize)]
struct VersionResponse {
    response: BTreeMap<String, String>,
}

/// `(node, version)` pairs sorted by node, where a node is `host:port`.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct VersionReport {
    pub nodes: Vec<(String, String)>,
}

impl VersionReport {
    pub fn parse(body: &str) -> Result<Self> {
        let parsed: VersionResponse = serde_json::from_str(body)?;
        Ok(Self {
            nodes: parsed.response.into_iter().collect(),
        })
    }

    pub fn get(&self, node: &str) -> Option<&str> {
        self.nodes
            .iter()
            .find(|(n, _)| n == node)
            .map(|(_, v)| v.as_str())
    }
}

#[tracing::instrument(skip(transport), fields(url = %url))]
pub fn fetch(transport: &dyn Transport, url: &Url) -> Result<VersionReport> {
    let report = VersionReport::parse(&transport.get(url)?)?;
    tracing::debug!(nodes = report.nodes.len(), "version report fetched");
    Ok(report)
}
