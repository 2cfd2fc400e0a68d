use thiserror::Error;

/// Identifies which list resource an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// Categorized tracker domains
    Blocklist,
    /// Entity ownership list
    EntityList,
}

impl std::fmt::Display for ListKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListKind::Blocklist => f.write_str("blocklist"),
            ListKind::EntityList => f.write_str("entity list"),
        }
    }
}

/// Blocklist engine error types
#[derive(Error, Debug)]
pub enum BlocklistError {
    #[error("Malformed {kind}: {source}")]
    Malformed {
        kind: ListKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("Category '{category}' is required by '{required_by}' but missing from the blocklist")]
    MissingCategory {
        category: String,
        required_by: String,
    },

    #[error("Failed to read {kind} from '{path}': {message}")]
    SourceError {
        kind: ListKind,
        path: String,
        message: String,
    },
}

impl BlocklistError {
    pub(crate) fn malformed(kind: ListKind, source: serde_json::Error) -> Self {
        BlocklistError::Malformed { kind, source }
    }

    /// True for errors caused by inconsistent list content rather than broken structure.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, BlocklistError::MissingCategory { .. })
    }
}

pub type Result<T> = std::result::Result<T, BlocklistError>;
