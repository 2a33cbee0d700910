use std::fmt;

/// One page of a paginated listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Continuation token for the next page, `None` on the last page
    pub next_token: Option<String>,
}

/// An image stored in a registry repository
///
/// Untagged images (dangling manifests, intermediate layers) only carry a digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageIdentifier {
    pub digest: Option<String>,
    pub tag: Option<String>,
}

#[cfg_attr(not(test), allow(dead_code))]
impl ImageIdentifier {
    pub fn new(digest: impl Into<String>, tag: Option<&str>) -> Self {
        Self {
            digest: Some(digest.into()),
            tag: tag.map(String::from),
        }
    }

    pub fn untagged(digest: impl Into<String>) -> Self {
        Self::new(digest, None)
    }
}

impl fmt::Display for ImageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.tag, &self.digest) {
            (Some(tag), Some(digest)) => write!(f, "{}@{}", tag, digest),
            (Some(tag), None) => write!(f, "{}", tag),
            (None, Some(digest)) => write!(f, "<untagged>@{}", digest),
            (None, None) => write!(f, "<unknown>"),
        }
    }
}

/// Why the registry could not delete one image of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageFailureKind {
    /// Already gone, e.g. removed by an earlier partial run
    NotFound,
    Other(String),
}

/// Per-image failure reported inside an otherwise successful batch delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFailure {
    pub image: ImageIdentifier,
    pub kind: ImageFailureKind,
    pub reason: Option<String>,
}
