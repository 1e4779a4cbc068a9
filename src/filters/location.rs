//! URL projection of the list filters
//!
//! The current location is the source of truth for filters: they are
//! decoded from it on every read and written back to it on every change.
//! Writes replace the current history entry, so filter tweaks never pile up
//! in back/forward navigation.

use std::sync::Mutex;

use super::{codec, FilterEdit, FilterError, FilterState};

/// Navigable location holding the list's query string
pub trait Navigator: Send + Sync {
    /// Query string of the current entry, without the leading `?`
    fn query(&self) -> String;

    /// Overwrite the current entry's query string without adding an entry
    fn replace(&self, query: &str);
}

#[derive(Debug, Default)]
struct HistoryInner {
    entries: Vec<String>,
    cursor: usize,
}

/// In-memory browser-style history
#[derive(Debug)]
pub struct MemoryHistory {
    inner: Mutex<HistoryInner>,
}

impl MemoryHistory {
    /// Start with a single entry holding `initial`
    pub fn new(initial: &str) -> Self {
        Self {
            inner: Mutex::new(HistoryInner {
                entries: vec![strip_question_mark(initial).to_string()],
                cursor: 0,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HistoryInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Navigate to a new entry, discarding any forward entries
    pub fn push(&self, query: &str) {
        let mut inner = self.lock();
        let cursor = inner.cursor;
        inner.entries.truncate(cursor + 1);
        inner.entries.push(strip_question_mark(query).to_string());
        inner.cursor += 1;
    }

    /// Go back one entry. Returns false at the first entry.
    pub fn back(&self) -> bool {
        let mut inner = self.lock();
        if inner.cursor == 0 {
            return false;
        }
        inner.cursor -= 1;
        true
    }

    /// Go forward one entry. Returns false at the last entry.
    pub fn forward(&self) -> bool {
        let mut inner = self.lock();
        if inner.cursor + 1 >= inner.entries.len() {
            return false;
        }
        inner.cursor += 1;
        true
    }

    /// Number of history entries
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("")
    }
}

impl Navigator for MemoryHistory {
    fn query(&self) -> String {
        let inner = self.lock();
        inner.entries.get(inner.cursor).cloned().unwrap_or_default()
    }

    fn replace(&self, query: &str) {
        let mut inner = self.lock();
        let cursor = inner.cursor;
        if let Some(entry) = inner.entries.get_mut(cursor) {
            *entry = strip_question_mark(query).to_string();
        }
    }
}

fn strip_question_mark(query: &str) -> &str {
    query.strip_prefix('?').unwrap_or(query)
}

/// Filters read from and written to a [`Navigator`]
#[derive(Debug)]
pub struct UrlFilters<N> {
    navigator: N,
}

impl<N: Navigator> UrlFilters<N> {
    pub fn new(navigator: N) -> Self {
        Self { navigator }
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Filters encoded in the current location
    pub fn filters(&self) -> FilterState {
        codec::decode(&self.navigator.query())
    }

    /// Replace the location with `filters`
    ///
    /// # Errors
    /// Invalid filters are refused and the location is left untouched.
    pub fn set(&self, filters: &FilterState) -> Result<FilterState, FilterError> {
        filters.validate()?;
        let query = codec::encode(filters);
        tracing::debug!("Replacing location query with '{}'", query);
        self.navigator.replace(&query);
        Ok(filters.clone())
    }

    /// Derive the next filters from the current ones and store them
    pub fn update<F>(&self, f: F) -> Result<FilterState, FilterError>
    where
        F: FnOnce(FilterState) -> FilterState,
    {
        let next = f(self.filters());
        self.set(&next)
    }

    /// Apply one filter panel edit
    pub fn apply(&self, edit: FilterEdit) -> Result<FilterState, FilterError> {
        self.update(|prev| prev.apply(edit))
    }
}
