//! Decoding of Solr JSON responses into [`Page`]s.
//!
//! The wire shape is
//! `{responseHeader:{status,QTime}, response:{numFound,start,docs}, facet_counts?, highlighting?}`,
//! or `{error:{msg,code}}` when the server rejects the query.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::QueryError;

/// One facet bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetValue {
    pub value: String,
    pub count: u64,
}

/// Facet buckets keyed by field name, in server order within a field.
pub type FacetCounts = BTreeMap<String, Vec<FacetValue>>;

/// Highlight fragments: document id -> field -> fragments.
pub type Highlighting = HashMap<String, HashMap<String, Vec<String>>>;

/// One bounded batch of results plus the total match count for the query.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub docs: Vec<T>,
    pub num_found: u64,
    pub start: u64,
    pub facets: Option<FacetCounts>,
    pub highlighting: Option<Highlighting>,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    /// Whether documents exist beyond this page.
    pub fn has_more(&self) -> bool { self.start + (self.docs.len() as u64) < self.num_found }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            docs: self.docs.into_iter().map(f).collect(),
            num_found: self.num_found,
            start: self.start,
            facets: self.facets,
            highlighting: self.highlighting,
        }
    }
}

impl<T: DeserializeOwned> Page<T> {
    /// Decode a search response body.
    ///
    /// A Solr error body or a non-zero header status becomes [`QueryError::Api`];
    /// anything else that does not match the expected shape is [`QueryError::Decode`].
    pub fn from_json(body: &[u8]) -> Result<Self, QueryError> {
        let envelope: Envelope<T> = serde_json::from_slice(body)?;

        if let Some(err) = envelope.error {
            return Err(QueryError::Api {
                code: err.code,
                message: err.msg.unwrap_or_else(|| "unspecified error".to_string()),
            });
        }

        if let Some(header) = &envelope.header
            && header.status != 0
        {
            return Err(QueryError::Api {
                code: Some(header.status),
                message: "non-zero response status".to_string(),
            });
        }

        let body = envelope
            .response
            .ok_or_else(|| QueryError::Decode("missing `response` object".to_string()))?;

        let facets = envelope
            .facet_counts
            .map(|fc| decode_facet_fields(fc.facet_fields))
            .transpose()?;

        Ok(Page {
            docs: body.docs,
            num_found: body.num_found,
            start: body.start,
            facets,
            highlighting: envelope.highlighting,
        })
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(rename = "responseHeader")]
    header: Option<ResponseHeader>,
    response: Option<ResponseBody<T>>,
    facet_counts: Option<RawFacetCounts>,
    highlighting: Option<Highlighting>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct ResponseHeader {
    #[serde(default)]
    status: i64,
}

#[derive(Deserialize)]
struct ResponseBody<T> {
    #[serde(rename = "numFound")]
    num_found: u64,
    #[serde(default)]
    start: u64,
    #[serde(default = "Vec::new")]
    docs: Vec<T>,
}

#[derive(Deserialize)]
struct RawFacetCounts {
    #[serde(default)]
    facet_fields: HashMap<String, Vec<Value>>,
}

#[derive(Deserialize)]
struct ApiError {
    msg: Option<String>,
    code: Option<i64>,
}

// Solr packs facet buckets as a flat `[value, count, value, count, ...]` array.
fn decode_facet_fields(fields: HashMap<String, Vec<Value>>) -> Result<FacetCounts, QueryError> {
    let mut out = FacetCounts::new();
    for (field, flat) in fields {
        if flat.len() % 2 != 0 {
            return Err(QueryError::Decode(format!(
                "facet field `{field}` has an odd number of entries"
            )));
        }

        let buckets = flat
            .chunks_exact(2)
            .map(|pair| {
                let value = match &pair[0] {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                let count = pair[1].as_u64().ok_or_else(|| {
                    QueryError::Decode(format!(
                        "facet count for `{field}`/`{value}` is not a number"
                    ))
                })?;
                Ok(FacetValue { value, count })
            })
            .collect::<Result<Vec<_>, QueryError>>()?;

        out.insert(field, buckets);
    }
    Ok(out)
}
