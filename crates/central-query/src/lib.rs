//! Query and pagination types for a Solr-backed artifact catalog.
//!
//! # Architecture
//!
//! Everything in this crate is pure data: no I/O, no clocks.
//! - [`Query`] - AND-joined field predicates with an optional raw override
//! - [`FetchRequest`] - a query plus its pagination window and protocol parameters
//! - [`Page`] - one decoded page of results with sidecar facet/highlight data
//! - [`Coordinate`] - a `group:artifact:version` triple and its repository path
//!
//! The I/O half lives in `central-fetch`.

mod coordinate;
mod doc;
mod error;
mod page;
mod query;
mod request;

pub use coordinate::Coordinate;
pub use doc::ArtifactDoc;
pub use error::QueryError;
pub use page::{FacetCounts, FacetValue, Highlighting, Page};
pub use query::Query;
pub use request::{DEFAULT_ROWS, FetchRequest, Sort};
