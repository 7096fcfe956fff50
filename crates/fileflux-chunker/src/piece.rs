//! Intermediate chunk pieces produced by the strategies.

/// One strategy-produced piece before conversion into a
/// [`fileflux_core::Chunk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    /// Piece text.
    pub text: String,
    /// Set when an indivisible unit exceeded the effective max.
    pub size_exceeded: bool,
    /// Ancestor heading path, for hierarchical chunking.
    pub hierarchy_path: Option<Vec<String>>,
}

impl Piece {
    /// Create a piece without a hierarchy path.
    pub fn new(text: impl Into<String>, size_exceeded: bool) -> Self {
        Self {
            text: text.into(),
            size_exceeded,
            hierarchy_path: None,
        }
    }

    /// Attach a hierarchy path.
    #[must_use]
    pub fn with_path(mut self, path: Vec<String>) -> Self {
        self.hierarchy_path = Some(path);
        self
    }
}
