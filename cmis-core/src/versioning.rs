//! Version series state
//!
//! A series is either `Released` or `CheckedOut`; at most one private working
//! copy exists per series. The repository is the authority on that state,
//! documents only carry a snapshot of it.

use crate::document::Document;
use crate::object::ObjectData;
use crate::properties::Properties;
use crate::session::Session;

/// Checkout state of a version series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    Released,
    CheckedOut,
}

/// Parameters of a check-in
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckInRequest {
    /// Create a major version (`2.0`) rather than a minor one (`1.1`)
    pub major: bool,
    /// Check-in comment; may be empty
    pub comment: String,
    /// Property updates applied to the new version
    pub properties: Properties,
}

impl CheckInRequest {
    pub fn new(major: bool, comment: impl Into<String>) -> Self {
        Self {
            major,
            comment: comment.into(),
            properties: Properties::new(),
        }
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }
}

/// All versions of one series, most recent first
///
/// A finite snapshot; iterate it as many times as needed.
#[derive(Debug, Clone)]
pub struct VersionHistory<'s> {
    versions: Vec<Document<'s>>,
}

impl<'s> VersionHistory<'s> {
    /// Build the history from binding records in any order
    pub fn new(session: &'s Session, records: Vec<ObjectData>) -> Self {
        let mut versions: Vec<Document<'s>> = records
            .into_iter()
            .map(|data| Document::new(session, data))
            .collect();
        // Stable: equal dates keep the binding's order
        versions.sort_by(|a, b| b.creation_date().cmp(&a.creation_date()));
        Self { versions }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Document<'s>> {
        self.versions.iter()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Most recent entry (the private working copy while checked out)
    pub fn latest(&self) -> Option<&Document<'s>> {
        self.versions.first()
    }

    /// Version labels in history order
    pub fn labels(&self) -> Vec<String> {
        self.versions
            .iter()
            .map(|d| d.version_label().unwrap_or_default().to_string())
            .collect()
    }

    pub fn into_vec(self) -> Vec<Document<'s>> {
        self.versions
    }
}

impl<'s> IntoIterator for VersionHistory<'s> {
    type Item = Document<'s>;
    type IntoIter = std::vec::IntoIter<Document<'s>>;

    fn into_iter(self) -> Self::IntoIter {
        self.versions.into_iter()
    }
}

impl<'a, 's> IntoIterator for &'a VersionHistory<'s> {
    type Item = &'a Document<'s>;
    type IntoIter = std::slice::Iter<'a, Document<'s>>;

    fn into_iter(self) -> Self::IntoIter {
        self.versions.iter()
    }
}
