use std::fmt;

/// Characters that may not appear anywhere in an index name.
pub const FORBIDDEN_INDEX_CHARS: &[char] = &['\\', ',', '#', '{', '}', ':'];

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidInput {
    #[error("illegal characters in index name")]
    IndexName,
    #[error("document identifier is not an integer")]
    DocumentId,
}

/// Returns true if `name` contains none of [`FORBIDDEN_INDEX_CHARS`].
pub fn is_valid_index_name(name: &str) -> bool {
    !name.chars().any(|c| FORBIDDEN_INDEX_CHARS.contains(&c))
}

/// Returns true if `id` is a base-10 integer that fits the 32-bit `integer` field of
/// the index mapping, with an optional sign and nothing else around it.
pub fn is_valid_document_id(id: &str) -> bool {
    id.parse::<i32>().is_ok()
}

/// An index name that passed [`is_valid_index_name`]. The text is kept exactly as
/// the caller sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexName(String);

impl IndexName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for IndexName {
    type Error = InvalidInput;

    fn try_from(name: &str) -> Result<Self, Self::Error> {
        if is_valid_index_name(name) {
            Ok(IndexName(name.to_owned()))
        } else {
            Err(InvalidInput::IndexName)
        }
    }
}

impl fmt::Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document identifier that passed [`is_valid_document_id`]. The original string
/// is preserved, so `+7` stays `+7` when relayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for DocumentId {
    type Error = InvalidInput;

    fn try_from(id: &str) -> Result<Self, Self::Error> {
        if is_valid_document_id(id) {
            Ok(DocumentId(id.to_owned()))
        } else {
            Err(InvalidInput::DocumentId)
        }
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
