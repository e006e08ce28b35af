use serde::{Deserialize, Serialize};

/// A search hit as returned by Maven Central's `select` endpoint.
///
/// Artifact-level hits carry `latestVersion`; version-level hits (`core=gav`)
/// carry `v`. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactDoc {
    pub id: String,
    #[serde(rename = "g")]
    pub group: String,
    #[serde(rename = "a")]
    pub artifact: String,
    #[serde(rename = "v", skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "latestVersion", skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<String>,
    #[serde(rename = "p")]
    pub packaging: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(rename = "versionCount", skip_serializing_if = "Option::is_none")]
    pub version_count: Option<u64>,
    /// Available extensions/classifier suffixes, e.g. `-sources.jar`.
    #[serde(rename = "ec")]
    pub extensions: Vec<String>,
    pub tags: Vec<String>,
    pub text: Vec<String>,
}

impl ArtifactDoc {
    /// The version this hit refers to, whichever core produced it.
    pub fn effective_version(&self) -> Option<&str> {
        self.version.as_deref().or(self.latest_version.as_deref())
    }
}
