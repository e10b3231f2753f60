use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::UserId;

/// Storage filename of an uploaded document.
///
/// The backend usually prefixes stored names with the owning user id
/// (`"{user_id}_notes.pdf"`). Use [`DocumentName::display_name`] for anything
/// shown to a person.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentName(String);

impl DocumentName {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// The storage name with the owner's prefix stripped.
    #[must_use]
    pub fn display_name<'a>(&'a self, user_id: &UserId) -> &'a str {
        display_name(&self.0, user_id.as_str())
    }
}

impl fmt::Debug for DocumentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentName({})", self.0)
    }
}

impl fmt::Display for DocumentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DocumentName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Strip a leading `"{user_id}_"` from `filename`.
///
/// Names without the prefix, and any name when `user_id` is empty, are
/// returned unchanged.
#[must_use]
pub fn display_name<'a>(filename: &'a str, user_id: &str) -> &'a str {
    if user_id.is_empty() {
        return filename;
    }
    filename
        .strip_prefix(user_id)
        .and_then(|rest| rest.strip_prefix('_'))
        .unwrap_or(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_owner_prefix() {
        assert_eq!(display_name("user_42_notes.pdf", "user_42"), "notes.pdf");
    }

    #[test]
    fn leaves_unprefixed_names_alone() {
        assert_eq!(display_name("notes.pdf", "user_42"), "notes.pdf");
        assert_eq!(display_name("user_42notes.pdf", "user_42"), "user_42notes.pdf");
    }

    #[test]
    fn empty_inputs() {
        assert_eq!(display_name("", "user_42"), "");
        assert_eq!(display_name("user_42_notes.pdf", ""), "user_42_notes.pdf");
    }

    #[test]
    fn document_name_uses_user_id() {
        let user = UserId::new("u1").unwrap();
        let doc = DocumentName::new("u1_biology.pdf");
        assert_eq!(doc.display_name(&user), "biology.pdf");
    }
}
