use std::fmt;
use std::str::FromStr;

use crate::error::QueryError;

const DEFAULT_EXTENSION: &str = "jar";

/// A Maven-style artifact coordinate.
///
/// Parsed from `group:artifact:version[:classifier][@extension]`; the
/// extension defaults to `jar`.
///
/// # Examples
///
/// ```
/// use central_query::Coordinate;
///
/// let c: Coordinate = "org.slf4j:slf4j-api:2.0.9:sources".parse().unwrap();
/// assert_eq!(c.path(), "org/slf4j/slf4j-api/2.0.9/slf4j-api-2.0.9-sources.jar");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub group: String,
    pub artifact: String,
    pub version: String,
    pub classifier: Option<String>,
    pub extension: String,
}

impl Coordinate {
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
            classifier: None,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    #[must_use]
    pub fn classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    #[must_use]
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Check that every part is a usable path segment.
    ///
    /// Parts may not be empty, `.` or `..`, or contain a path separator, so the
    /// repository path always stays below the repository root.
    ///
    /// # Errors
    ///
    /// [`QueryError::InvalidCoordinate`] naming the coordinate.
    pub fn validate(&self) -> Result<(), QueryError> {
        let segments = self
            .group
            .split('.')
            .chain([self.artifact.as_str(), self.version.as_str(), self.extension.as_str()])
            .chain(self.classifier.as_deref());
        for segment in segments {
            if segment.trim().is_empty()
                || segment == "."
                || segment == ".."
                || segment.contains(['/', '\\'])
            {
                return Err(QueryError::InvalidCoordinate(self.to_string()));
            }
        }
        Ok(())
    }

    /// File name inside the version directory.
    pub fn file_name(&self) -> String {
        match &self.classifier {
            Some(c) => format!("{}-{}-{c}.{}", self.artifact, self.version, self.extension),
            None => format!("{}-{}.{}", self.artifact, self.version, self.extension),
        }
    }

    /// Repository-relative path, group dots turned into directories.
    pub fn path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.group.replace('.', "/"),
            self.artifact,
            self.version,
            self.file_name()
        )
    }
}

impl FromStr for Coordinate {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || QueryError::InvalidCoordinate(s.to_string());

        let (gav, extension) = match s.split_once('@') {
            Some((gav, ext)) if !ext.is_empty() => (gav, ext),
            Some(_) => return Err(invalid()),
            None => (s, DEFAULT_EXTENSION),
        };

        let parts: Vec<&str> = gav.split(':').collect();
        if parts.iter().any(|p| p.trim().is_empty()) {
            return Err(invalid());
        }

        let mut coord = match parts.as_slice() {
            [g, a, v] | [g, a, v, _] => Coordinate::new(*g, *a, *v),
            _ => return Err(invalid()),
        };
        if let [_, _, _, c] = parts.as_slice() {
            coord.classifier = Some((*c).to_string());
        }
        coord.extension = extension.to_string();
        coord.validate().map_err(|_| invalid())?;
        Ok(coord)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)?;
        if let Some(c) = &self.classifier {
            write!(f, ":{c}")?;
        }
        if self.extension != DEFAULT_EXTENSION {
            write!(f, "@{}", self.extension)?;
        }
        Ok(())
    }
}
