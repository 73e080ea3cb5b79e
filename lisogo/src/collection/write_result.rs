use crate::document::DocumentId;

/// The identifiers affected by an insert or a remove.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WriteResult {
    ids: Vec<DocumentId>,
}

impl WriteResult {
    pub fn new(ids: Vec<DocumentId>) -> Self {
        Self { ids }
    }

    pub fn affected_ids(&self) -> &[DocumentId] {
        &self.ids
    }

    pub fn affected_count(&self) -> usize {
        self.ids.len()
    }
}

impl IntoIterator for WriteResult {
    type Item = DocumentId;
    type IntoIter = std::vec::IntoIter<DocumentId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.into_iter()
    }
}

/// The outcome of a replacement update.
///
/// `matched_ids` lists the documents the query matched and that were
/// replaced; `upserted_id` is set when nothing matched and a new document
/// was written instead.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateResult {
    matched_ids: Vec<DocumentId>,
    upserted_id: Option<DocumentId>,
}

impl UpdateResult {
    pub fn matched(ids: Vec<DocumentId>) -> Self {
        Self {
            matched_ids: ids,
            upserted_id: None,
        }
    }

    pub fn upserted(id: DocumentId) -> Self {
        Self {
            matched_ids: Vec::new(),
            upserted_id: Some(id),
        }
    }

    pub fn matched_ids(&self) -> &[DocumentId] {
        &self.matched_ids
    }

    pub fn matched_count(&self) -> usize {
        self.matched_ids.len()
    }

    pub fn upserted_id(&self) -> Option<&DocumentId> {
        self.upserted_id.as_ref()
    }

    /// Returns the single document written by this update, if exactly one
    /// was.
    pub fn written_id(&self) -> Option<&DocumentId> {
        match (&self.upserted_id, self.matched_ids.as_slice()) {
            (Some(id), _) => Some(id),
            (None, [id]) => Some(id),
            _ => None,
        }
    }
}
