//! Structured field extraction from aggregated document text.
//!
//! Each field is a registered matcher that proposes scored candidates; the
//! extractor keeps the best one per field. Adding a field means registering
//! another matcher, nothing else changes.

pub mod amount;
pub mod language;
pub mod matchers;
pub mod patterns;

pub use language::detect_language;
pub use patterns::PatternBank;

use crate::error::DocsortError;
use std::collections::BTreeMap;

/// A proposed value for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub value: String,
    /// Always within `[0, 1]`, rounded to two decimals.
    pub confidence: f64,
    /// Byte offset of the value in the document text.
    pub position: usize,
}

impl Candidate {
    pub fn new(value: impl Into<String>, confidence: f64, position: usize) -> Self {
        Candidate {
            value: value.into(),
            confidence: clamp_confidence(confidence),
            position,
        }
    }
}

pub fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        return 0.0;
    }
    (confidence.clamp(0.0, 1.0) * 100.0).round() / 100.0
}

/// A non-blank line of the document and where it starts.
#[derive(Debug, Clone, Copy)]
pub struct Line<'a> {
    pub text: &'a str,
    pub offset: usize,
}

/// The text every matcher sees, pre-split into lines.
#[derive(Debug)]
pub struct FieldContext<'a> {
    pub text: &'a str,
    pub lines: Vec<Line<'a>>,
}

impl<'a> FieldContext<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut lines = Vec::new();
        let mut offset = 0;
        for raw in text.split('\n') {
            let line = raw.trim_end_matches('\r');
            if !line.trim().is_empty() {
                lines.push(Line { text: line, offset });
            }
            offset += raw.len() + 1;
        }
        FieldContext { text, lines }
    }
}

pub type Matcher = fn(&FieldContext<'_>, &PatternBank) -> Vec<Candidate>;

/// Extracted values keyed by field name. Every registered field has a
/// `values` entry; only found fields have a confidence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    pub values: BTreeMap<String, Option<String>>,
    pub confidence: BTreeMap<String, f64>,
}

pub struct FieldExtractor {
    bank: PatternBank,
    registry: Vec<(&'static str, Matcher)>,
}

impl FieldExtractor {
    /// Extractor with the built-in pattern bank and every built-in field.
    pub fn new() -> Result<Self, DocsortError> {
        Ok(Self::with_bank(PatternBank::builtin()?))
    }

    pub fn with_bank(bank: PatternBank) -> Self {
        let mut extractor = FieldExtractor {
            bank,
            registry: Vec::with_capacity(matchers::BUILTIN.len()),
        };
        for &(name, matcher) in matchers::BUILTIN {
            extractor.register(name, matcher);
        }
        extractor
    }

    /// Register a matcher, replacing any existing one for the same field.
    pub fn register(&mut self, name: &'static str, matcher: Matcher) {
        match self.registry.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = matcher,
            None => self.registry.push((name, matcher)),
        }
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.registry.iter().map(|(name, _)| *name).collect()
    }

    pub fn extract(&self, text: &str) -> FieldSet {
        let ctx = FieldContext::new(text);
        let mut fields = FieldSet::default();

        for &(name, matcher) in &self.registry {
            match select(matcher(&ctx, &self.bank)) {
                Some(best) => {
                    fields.confidence.insert(name.to_string(), best.confidence);
                    fields.values.insert(name.to_string(), Some(best.value));
                }
                None => {
                    fields.values.insert(name.to_string(), None);
                }
            }
        }

        tracing::debug!(
            found = fields.confidence.len(),
            fields = self.registry.len(),
            "field extraction finished"
        );
        fields
    }
}

/// Highest confidence wins; ties go to the earliest position.
pub fn select(candidates: Vec<Candidate>) -> Option<Candidate> {
    candidates.into_iter().reduce(|best, c| {
        let better = c.confidence > best.confidence
            || (c.confidence == best.confidence && c.position < best.position);
        if better {
            c
        } else {
            best
        }
    })
}
