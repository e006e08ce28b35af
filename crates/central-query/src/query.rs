use std::fmt;

/// Expression matching every document.
const MATCH_ALL: &str = "*:*";

/// A search expression built from `key:value` predicates.
///
/// Predicates are AND-joined in insertion order. A raw override, when set,
/// replaces the predicates entirely; it is passed to the server verbatim.
///
/// # Examples
///
/// ```
/// use central_query::Query;
///
/// let q = Query::new().field("g", "org.slf4j").field("a", "slf4j-api");
/// assert_eq!(q.to_expression(), "g:org.slf4j AND a:slf4j-api");
///
/// let raw = Query::raw("fc:org.junit.Test");
/// assert_eq!(raw.to_expression(), "fc:org.junit.Test");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Query {
    predicates: Vec<(String, String)>,
    raw: Option<String>,
}

impl Query {
    pub fn new() -> Self { Self::default() }

    /// A query consisting only of a raw expression.
    pub fn raw(expression: impl Into<String>) -> Self {
        Self {
            predicates: Vec::new(),
            raw: Some(expression.into()),
        }
    }

    /// Add a `key:value` predicate.
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.predicates.push((key.into(), value.into()));
        self
    }

    /// Set or clear the raw override.
    #[must_use]
    pub fn with_raw(mut self, expression: Option<String>) -> Self {
        self.raw = expression;
        self
    }

    pub fn predicates(&self) -> &[(String, String)] { &self.predicates }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty() && self.raw.as_deref().is_none_or(|r| r.trim().is_empty())
    }

    /// Serialize to the single expression sent as `q`.
    ///
    /// Values containing whitespace are double-quoted unless already quoted.
    /// An empty query matches everything.
    pub fn to_expression(&self) -> String {
        if let Some(raw) = self.raw.as_deref().map(str::trim)
            && !raw.is_empty()
        {
            return raw.to_string();
        }

        if self.predicates.is_empty() {
            return MATCH_ALL.to_string();
        }

        self.predicates
            .iter()
            .map(|(k, v)| format!("{k}:{}", quote_if_needed(v)))
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

fn quote_if_needed(value: &str) -> String {
    let already_quoted = value.len() >= 2 && value.starts_with('"') && value.ends_with('"');
    if !already_quoted && value.chars().any(char::is_whitespace) {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_expression())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates_are_and_joined_in_order() {
        let q = Query::new()
            .field("g", "com.google.guava")
            .field("a", "guava")
            .field("v", "33.0.0-jre");
        assert_eq!(
            q.to_expression(),
            "g:com.google.guava AND a:guava AND v:33.0.0-jre"
        );
    }

    #[test]
    fn test_raw_override_wins_over_predicates() {
        let q = Query::new()
            .field("g", "ignored")
            .with_raw(Some("tags:sample".to_string()));
        assert_eq!(q.to_expression(), "tags:sample");
    }

    #[test]
    fn test_blank_raw_falls_back_to_predicates() {
        let q = Query::new().field("a", "guice").with_raw(Some("   ".to_string()));
        assert_eq!(q.to_expression(), "a:guice");
    }

    #[test]
    fn test_empty_query_matches_all() {
        assert!(Query::new().is_empty());
        assert_eq!(Query::new().to_expression(), "*:*");
    }

    #[test]
    fn test_whitespace_values_are_quoted() {
        let q = Query::new().field("text", "hello world");
        assert_eq!(q.to_expression(), "text:\"hello world\"");

        let pre = Query::new().field("text", "\"already quoted\"");
        assert_eq!(pre.to_expression(), "text:\"already quoted\"");
    }

    #[test]
    fn test_display_matches_expression() {
        let q = Query::new().field("l", "javadoc");
        assert_eq!(q.to_string(), "l:javadoc");
    }
}
