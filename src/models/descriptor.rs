use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Complete indexed record for one catalog entry.
///
/// `id` is assigned by the upstream registry and is stable across updates.
/// The analytics fields are maintained by external batch jobs and travel
/// through this service verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Unique identifier
    #[serde(default)]
    pub id: String,

    /// Human-readable name
    #[serde(default)]
    pub name: String,

    /// Detailed description
    #[serde(default)]
    pub description: String,

    /// Author or maintainer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Homepage URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,

    /// Origin of the descriptor (e.g. github, community, private)
    #[serde(default)]
    pub source: String,

    /// Repository URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    /// License identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    /// Categorical tags
    #[serde(default)]
    pub categories: Vec<String>,

    /// Package distribution entries
    #[serde(default)]
    pub packages: Vec<PackageRef>,

    /// Version information
    #[serde(default)]
    pub version: VersionInfo,

    /// Remote access endpoints
    #[serde(default)]
    pub remotes: Vec<RemoteEndpoint>,

    /// Exposed tool capabilities
    #[serde(default)]
    pub tools: Vec<Capability>,

    /// Exposed prompt capabilities
    #[serde(default)]
    pub prompts: Vec<Capability>,

    /// Exposed template capabilities
    #[serde(default)]
    pub templates: Vec<Capability>,

    /// When this descriptor first entered the index
    #[serde(default = "now")]
    pub indexed_at: DateTime<Utc>,

    /// When this descriptor last changed
    #[serde(default = "now")]
    pub last_updated: DateTime<Utc>,

    /// Cumulative install count
    #[serde(default)]
    pub install_count: i64,

    /// Mean rating
    #[serde(default)]
    pub rating_average: f64,

    /// Number of ratings
    #[serde(default)]
    pub rating_count: i64,

    /// Popularity score (externally computed)
    #[serde(default)]
    pub popularity_score: f64,

    /// Trending score (externally computed)
    #[serde(default)]
    pub trending_score: f64,

    /// Quality score (externally computed)
    #[serde(default)]
    pub quality_score: f64,

    /// Relevance score, populated on search hits only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

impl ServiceDescriptor {
    /// Decode a descriptor from an event payload.
    ///
    /// Missing fields take their defaults; a structurally incompatible
    /// payload (wrong types) is a decode failure.
    pub fn from_payload(
        payload: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::Value::Object(payload.clone()))
    }

    /// Compare two descriptors ignoring the timestamp and score annotations.
    pub fn same_content(&self, other: &ServiceDescriptor) -> bool {
        let normalize = |d: &ServiceDescriptor| {
            let mut d = d.clone();
            d.indexed_at = DateTime::<Utc>::MIN_UTC;
            d.last_updated = DateTime::<Utc>::MIN_UTC;
            d.score = None;
            serde_json::to_value(d).unwrap_or(serde_json::Value::Null)
        };
        normalize(self) == normalize(other)
    }
}

/// One package distribution entry (npm, pypi, docker, ...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackageRef {
    /// Distribution type
    #[serde(rename = "type", default)]
    pub package_type: String,

    /// Package name within the registry
    #[serde(default)]
    pub name: String,

    /// Pinned version, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Version metadata for a descriptor
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VersionInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<String>,
}

/// One remote connection method
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RemoteEndpoint {
    /// Endpoint type
    #[serde(rename = "type", default)]
    pub endpoint_type: String,

    /// Transport protocol (stdio, http, sse)
    #[serde(default)]
    pub transport: String,

    /// Launch command for stdio transports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Command arguments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Endpoint URL for network transports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Extra headers required by the endpoint
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

/// A named capability (tool, prompt, or template)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Capability {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
