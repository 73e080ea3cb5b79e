/// Options for controlling find operations.
///
/// # Examples
///
/// ```rust,ignore
/// use lisogo::collection::{limit_to, project, skip_by, FindOptions};
///
/// let options = FindOptions::new().skip(10).limit(20);
/// let options = skip_by(5);
/// let options = limit_to(100);
/// let options = project(&["title"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FindOptions {
    pub(crate) projection: Option<Vec<String>>,
    pub(crate) skip: Option<u64>,
    pub(crate) limit: Option<u64>,
}

/// Creates `FindOptions` that skips the first `skip` results.
pub fn skip_by(skip: u64) -> FindOptions {
    FindOptions {
        projection: None,
        skip: Some(skip),
        limit: None,
    }
}

/// Creates `FindOptions` returning at most `limit` results.
pub fn limit_to(limit: u64) -> FindOptions {
    FindOptions {
        projection: None,
        skip: None,
        limit: Some(limit),
    }
}

/// Creates `FindOptions` that only reads `fields`.
///
/// Projected results bypass the identity cache: a partial document never
/// replaces or reuses a cached instance.
pub fn project(fields: &[&str]) -> FindOptions {
    FindOptions {
        projection: Some(fields.iter().map(|f| f.to_string()).collect()),
        skip: None,
        limit: None,
    }
}

impl FindOptions {
    pub fn new() -> FindOptions {
        FindOptions {
            projection: None,
            skip: None,
            limit: None,
        }
    }

    /// Sets the number of documents to skip.
    pub fn skip(mut self, skip: u64) -> FindOptions {
        self.skip = Some(skip);
        self
    }

    /// Sets the maximum number of documents to return.
    pub fn limit(mut self, limit: u64) -> FindOptions {
        self.limit = Some(limit);
        self
    }

    /// Restricts the returned fields to `fields`. `_id`, `_type` and
    /// `_types_mapping` are always returned.
    pub fn projection(mut self, fields: &[&str]) -> FindOptions {
        self.projection = Some(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn skip_count(&self) -> Option<u64> {
        self.skip
    }

    pub fn limit_count(&self) -> Option<u64> {
        self.limit
    }

    pub fn projected_fields(&self) -> Option<&[String]> {
        self.projection.as_deref()
    }

    pub fn is_projected(&self) -> bool {
        self.projection.is_some()
    }
}
