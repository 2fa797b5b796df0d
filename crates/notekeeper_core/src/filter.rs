//! crates/notekeeper_core/src/filter.rs
//!
//! The note search predicate. Each field is an independent, optional
//! constraint; a note matches when every supplied constraint holds.

use crate::domain::{Note, NoteStatus};
use crate::error::ServiceResult;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFilter {
    /// Lowercased substring searched for in title and content.
    query: Option<String>,
    status: Option<NoteStatus>,
    /// Exact, case-sensitive category label.
    category: Option<String>,
}

impl NoteFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a filter from raw request parameters.
    ///
    /// Empty strings count as omitted. An unknown status is rejected rather
    /// than silently matching nothing.
    pub fn from_raw(
        query: Option<&str>,
        status: Option<&str>,
        category: Option<&str>,
    ) -> ServiceResult<Self> {
        let status = non_empty(status).map(str::parse::<NoteStatus>).transpose()?;
        let mut filter = Self::new();
        if let Some(q) = non_empty(query) {
            filter = filter.with_query(q);
        }
        if let Some(status) = status {
            filter = filter.with_status(status);
        }
        if let Some(category) = non_empty(category) {
            filter = filter.with_category(category);
        }
        Ok(filter)
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.query = Some(query.to_lowercase());
        self
    }

    pub fn with_status(mut self, status: NoteStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn status(&self) -> Option<NoteStatus> {
        self.status
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn matches(&self, note: &Note) -> bool {
        let query_ok = self.query.as_deref().map_or(true, |q| {
            note.title.to_lowercase().contains(q) || note.content.to_lowercase().contains(q)
        });
        let status_ok = self.status.map_or(true, |s| note.status == s);
        let category_ok = self
            .category
            .as_deref()
            .map_or(true, |c| note.category == c);
        query_ok && status_ok && category_ok
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
