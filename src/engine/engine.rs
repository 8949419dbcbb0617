// src/engine/engine.rs
use regex::Regex;

use super::types::Field;
use crate::error::Result;

/// A single pattern-based matcher. Capture group 1 is the candidate text; `parse`
/// turns it into a canonical value (or rejects it).
pub struct Strategy<T> {
    pub name: &'static str,
    regex: Regex,
    parse: fn(&str) -> Option<T>,
}

impl<T> Strategy<T> {
    pub fn new(name: &'static str, pattern: &str, parse: fn(&str) -> Option<T>) -> Result<Self> {
        Ok(Self { name, regex: Regex::new(pattern)?, parse })
    }

    /// Every parsable candidate in document order, with its raw capture.
    pub fn candidates<'c>(&'c self, content: &'c str) -> impl Iterator<Item = (&'c str, T)> + 'c {
        self.regex.captures_iter(content).filter_map(move |caps| {
            let raw = caps.get(1)?.as_str();
            let value = (self.parse)(raw)?;
            Some((raw, value))
        })
    }
}

/// Ordered strategies for one logical field, most trustworthy first, plus the
/// field's plausibility check.
pub struct FieldRule<T> {
    pub field: &'static str,
    strategies: Vec<Strategy<T>>,
    validate: fn(&T) -> bool,
}

impl<T: Default> FieldRule<T> {
    pub fn new(field: &'static str, validate: fn(&T) -> bool) -> Self {
        Self { field, strategies: Vec::new(), validate }
    }

    /// Append a strategy at the lowest priority so far.
    pub fn then(mut self, name: &'static str, pattern: &str, parse: fn(&str) -> Option<T>) -> Result<Self> {
        self.strategies.push(Strategy::new(name, pattern, parse)?);
        Ok(self)
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name).collect()
    }

    /// First candidate, in priority order, that passes validation.
    /// Falls back to the `not_found` sentinel; a miss is not an error.
    pub fn evaluate(&self, content: &str) -> Field<T> {
        self.evaluate_where(content, |_| true)
    }

    /// Like `evaluate`, with an extra check that depends on already-extracted
    /// context (e.g. "daily must differ from total").
    pub fn evaluate_where(&self, content: &str, also: impl Fn(&T) -> bool) -> Field<T> {
        for strategy in &self.strategies {
            for (raw, value) in strategy.candidates(content) {
                if (self.validate)(&value) && also(&value) {
                    return Field { value, raw: raw.trim().to_string(), source: strategy.name };
                }
                logd!(field = self.field, strategy = strategy.name, raw, "candidate rejected");
            }
        }
        Field::not_found()
    }
}

/// First found field among `fields`, else the sentinel.
pub fn first_found<T: Default>(fields: impl IntoIterator<Item = Field<T>>) -> Field<T> {
    fields.into_iter().find(Field::is_found).unwrap_or_else(Field::not_found)
}
