// src/engine/types.rs
use std::collections::HashMap;

/// Source tag for a field no strategy could fill.
pub const NOT_FOUND: &str = "not_found";
/// Source tag for a value taken from the override table.
pub const KNOWN_EXACT: &str = "known_exact";

/// One extracted field: canonical value, the text it came from, and which
/// strategy produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field<T> {
    pub value: T,
    pub raw: String,
    pub source: &'static str,
}

impl<T: Default> Field<T> {
    /// Sentinel for "no strategy matched": default value, empty raw text.
    pub fn not_found() -> Self {
        Self { value: T::default(), raw: s!(), source: NOT_FOUND }
    }
}

impl<T> Field<T> {
    pub fn is_found(&self) -> bool {
        self.source != NOT_FOUND
    }
}

/// Independently verified value for one artist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KnownValue {
    pub monthly_listeners: u64,
    pub artist_name: Option<String>,
}

/// Injected corrections keyed by artist id. Consulted after strategy evaluation;
/// a hit replaces the extracted value outright.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Overrides {
    table: HashMap<String, KnownValue>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, artist_id: impl Into<String>, known: KnownValue) {
        self.table.insert(artist_id.into(), known);
    }

    pub fn get(&self, artist_id: &str) -> Option<&KnownValue> {
        self.table.get(artist_id)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl FromIterator<(String, KnownValue)> for Overrides {
    fn from_iter<I: IntoIterator<Item = (String, KnownValue)>>(iter: I) -> Self {
        Self { table: iter.into_iter().collect() }
    }
}
