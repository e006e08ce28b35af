use url::Url;

use crate::error::QueryError;
use crate::query::Query;

/// Page size used when the caller does not choose one.
pub const DEFAULT_ROWS: u32 = 20;

/// Sort order applied server-side.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sort {
    pub field: String,
    pub ascending: bool,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: true,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: false,
        }
    }

    fn to_param(&self) -> String {
        let dir = if self.ascending { "asc" } else { "desc" };
        format!("{} {dir}", self.field)
    }
}

/// A query together with its pagination window and protocol parameters.
///
/// `start` is the zero-based offset of the first document; `rows` is the page
/// size. Paged iteration advances `start` and leaves everything else alone.
///
/// # Examples
///
/// ```
/// use central_query::{FetchRequest, Query, Sort};
///
/// let req = FetchRequest::new(Query::new().field("g", "org.apache.commons"))
///     .rows(50)
///     .sort(Sort::desc("timestamp"))
///     .core("gav")
///     .facet_field("p");
/// assert_eq!(req.rows, 50);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchRequest {
    pub query: Query,
    pub start: u64,
    pub rows: u32,
    pub sort: Option<Sort>,
    /// Collection selector (`core=`), e.g. `gav` for every version.
    pub core: Option<String>,
    pub facet_fields: Vec<String>,
    pub highlight_fields: Vec<String>,
    /// Extra parameters appended after the standard ones, in order.
    pub params: Vec<(String, String)>,
}

impl FetchRequest {
    pub fn new(query: Query) -> Self {
        Self {
            query,
            start: 0,
            rows: DEFAULT_ROWS,
            sort: None,
            core: None,
            facet_fields: Vec::new(),
            highlight_fields: Vec::new(),
            params: Vec::new(),
        }
    }

    #[must_use]
    pub fn start(mut self, start: u64) -> Self {
        self.start = start;
        self
    }

    #[must_use]
    pub fn rows(mut self, rows: u32) -> Self {
        self.rows = rows;
        self
    }

    #[must_use]
    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    #[must_use]
    pub fn core(mut self, core: impl Into<String>) -> Self {
        self.core = Some(core.into());
        self
    }

    #[must_use]
    pub fn facet_field(mut self, field: impl Into<String>) -> Self {
        self.facet_fields.push(field.into());
        self
    }

    #[must_use]
    pub fn highlight_field(mut self, field: impl Into<String>) -> Self {
        self.highlight_fields.push(field.into());
        self
    }

    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Reject requests that could never make progress.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.rows == 0 {
            return Err(QueryError::ZeroRows);
        }
        Ok(())
    }

    /// The wire parameters in the order they are sent.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("q".to_string(), self.query.to_expression()),
            ("start".to_string(), self.start.to_string()),
            ("rows".to_string(), self.rows.to_string()),
        ];

        if let Some(sort) = &self.sort {
            pairs.push(("sort".to_string(), sort.to_param()));
        }
        if let Some(core) = &self.core {
            pairs.push(("core".to_string(), core.clone()));
        }
        pairs.push(("wt".to_string(), "json".to_string()));

        if !self.facet_fields.is_empty() {
            pairs.push(("facet".to_string(), "true".to_string()));
            for field in &self.facet_fields {
                pairs.push(("facet.field".to_string(), field.clone()));
            }
        }
        if !self.highlight_fields.is_empty() {
            pairs.push(("hl".to_string(), "true".to_string()));
            pairs.push(("hl.fl".to_string(), self.highlight_fields.join(",")));
        }

        pairs.extend(self.params.iter().cloned());
        pairs
    }

    /// Append the encoded parameters to `base`, replacing any query it carried.
    pub fn to_url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        url.set_query(None);
        url.query_pairs_mut().extend_pairs(self.query_pairs());
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url { Url::parse("https://search.example.org/solrsearch/select").unwrap() }

    #[test]
    fn test_minimal_request_encodes_standard_params() {
        let req = FetchRequest::new(Query::new().field("a", "guice"));
        let url = req.to_url(&base());
        assert_eq!(
            url.as_str(),
            "https://search.example.org/solrsearch/select?q=a%3Aguice&start=0&rows=20&wt=json"
        );
    }

    #[test]
    fn test_optional_params_follow_wire_order() {
        let req = FetchRequest::new(Query::new().field("g", "junit"))
            .start(40)
            .rows(10)
            .sort(Sort::desc("timestamp"))
            .core("gav")
            .facet_field("p")
            .facet_field("l")
            .highlight_field("fch")
            .param("fl", "id,g,a");

        let keys: Vec<_> = req.query_pairs().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            [
                "q",
                "start",
                "rows",
                "sort",
                "core",
                "wt",
                "facet",
                "facet.field",
                "facet.field",
                "hl",
                "hl.fl",
                "fl"
            ]
        );

        let pairs = req.query_pairs();
        assert!(pairs.contains(&("sort".to_string(), "timestamp desc".to_string())));
        assert!(pairs.contains(&("start".to_string(), "40".to_string())));
    }

    #[test]
    fn test_base_query_string_is_replaced() {
        let base = Url::parse("https://search.example.org/select?stale=1").unwrap();
        let url = FetchRequest::new(Query::new()).to_url(&base);
        assert!(!url.as_str().contains("stale"));
        assert!(url.as_str().contains("q=*%3A*"));
    }

    #[test]
    fn test_zero_rows_is_rejected() {
        let req = FetchRequest::new(Query::new()).rows(0);
        assert_eq!(req.validate(), Err(QueryError::ZeroRows));
        assert!(FetchRequest::new(Query::new()).validate().is_ok());
    }
}
