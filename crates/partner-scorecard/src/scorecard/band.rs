use regex::Regex;
use std::sync::OnceLock;

/// Parsed form of a band definition string.
#[derive(Debug, Clone, PartialEq)]
pub enum BandRule {
    GreaterThan(f64),
    LessThan(f64),
    /// Inclusive bounds in the order they were written.
    Range(f64, f64),
    Literal(String),
    Empty,
    /// A comparison or range band whose numbers could not be extracted.
    Malformed(String),
}

impl BandRule {
    /// Classifies a raw band. `>` wins over `<`, which wins over `-`; anything
    /// else non-empty is a literal.
    pub fn parse(raw: &str) -> Self {
        let band = normalize(raw);
        if band.is_empty() {
            return Self::Empty;
        }

        if band.contains('>') {
            match first_number(&band) {
                Some(threshold) => Self::GreaterThan(threshold),
                None => Self::Malformed(band),
            }
        } else if band.contains('<') {
            match first_number(&band) {
                Some(threshold) => Self::LessThan(threshold),
                None => Self::Malformed(band),
            }
        } else if band.contains('-') {
            match first_two_numbers(&band) {
                Some((low, high)) => Self::Range(low, high),
                None => Self::Malformed(band),
            }
        } else {
            Self::Literal(band)
        }
    }

    pub fn matches(&self, value: &PerformanceValue) -> bool {
        match self {
            Self::GreaterThan(threshold) => value.number.is_some_and(|number| number > *threshold),
            Self::LessThan(threshold) => value.number.is_some_and(|number| number < *threshold),
            Self::Range(low, high) => value
                .number
                .is_some_and(|number| *low <= number && number <= *high),
            Self::Literal(text) => value.text.contains(text.as_str()) || text.contains(&value.text),
            Self::Empty | Self::Malformed(_) => false,
        }
    }
}

/// A performance value after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceValue {
    pub text: String,
    pub number: Option<f64>,
}

impl PerformanceValue {
    pub fn parse(raw: &str) -> Self {
        let text = normalize(raw);
        // Stripping `%` can expose trailing whitespace ("4 %").
        let number = text.trim().parse::<f64>().ok();
        Self { text, number }
    }
}

/// Trims, lowercases and strips `$`, `,` and `%`.
pub fn normalize(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .filter(|ch| !matches!(ch, '$' | ',' | '%'))
        .collect()
}

fn number_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\d*\.?\d+").ok())
        .as_ref()
}

fn numbers(band: &str) -> impl Iterator<Item = f64> + '_ {
    number_pattern()
        .into_iter()
        .flat_map(move |pattern| pattern.find_iter(band))
        .filter_map(|found| found.as_str().parse::<f64>().ok())
}

pub(crate) fn first_number(band: &str) -> Option<f64> {
    numbers(band).next()
}

pub(crate) fn first_two_numbers(band: &str) -> Option<(f64, f64)> {
    let mut found = numbers(band);
    Some((found.next()?, found.next()?))
}
