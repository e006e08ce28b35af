use std::fmt;

use serde::{Deserialize, Serialize};

/// A caller-declared request category with its own configured rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationClass {
    Search,
    Download,
    #[default]
    Default,
}

impl fmt::Display for OperationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationClass::Search => write!(f, "search"),
            OperationClass::Download => write!(f, "download"),
            OperationClass::Default => write!(f, "default"),
        }
    }
}
