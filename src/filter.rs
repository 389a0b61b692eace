//! Content filter chain.
//!
//! Three pure predicates over pre-loaded exclusion rule sets. Filter
//! rejection is a normal negative outcome, never an error; a language
//! detector that cannot classify a text counts as rejection.

use crate::config::FilterConfig;
use whatlang::{Detector, Lang};

/// Filter chain with lowercased keyword lists baked in at construction.
pub struct FilterChain {
    artist_exclude: Vec<String>,
    title_exclude: Vec<String>,
    min_length: usize,
    max_length: usize,
    detector: Detector,
}

impl FilterChain {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            artist_exclude: lowercase_all(&config.artist_exclude),
            title_exclude: lowercase_all(&config.title_exclude),
            min_length: config.min_length,
            max_length: config.max_length,
            // Restrict the detector to the languages the site actually
            // mixes; keeps short texts from drifting to unrelated languages.
            detector: Detector::with_allowlist(vec![Lang::Por, Lang::Eng, Lang::Spa]),
        }
    }

    /// Accept an artist unless an exclusion keyword occurs in the name.
    pub fn accepts_artist(&self, name: &str) -> bool {
        !contains_any(name, &self.artist_exclude)
    }

    /// Accept a song title unless an exclusion keyword occurs in it.
    pub fn accepts_title(&self, title: &str) -> bool {
        !contains_any(title, &self.title_exclude)
    }

    /// Accept lyrics that are within the length bounds, classify as
    /// Portuguese, and pass the title keyword scan applied to the full
    /// body. The title-list reuse against lyrics bodies is intentional
    /// policy (it catches recurring devotional boilerplate), not an
    /// accident.
    ///
    /// Checks are ordered cheapest-first; the final boolean does not
    /// depend on the ordering.
    pub fn accepts_lyrics(&self, content: &str) -> bool {
        let length = content.chars().count();
        if length < self.min_length || length > self.max_length {
            return false;
        }

        if !self.is_portuguese(content) {
            return false;
        }

        self.accepts_title(content)
    }

    fn is_portuguese(&self, text: &str) -> bool {
        let cleaned = normalize_for_detection(text);
        if cleaned.is_empty() {
            return false;
        }

        // Uncertain language means excluded, not an error.
        self.detector
            .detect_lang(&cleaned)
            .map(|lang| lang == Lang::Por)
            .unwrap_or(false)
    }
}

/// Collapse whitespace and drop digits/punctuation so the detector sees
/// only word material.
fn normalize_for_detection(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = true;

    for c in text.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
        } else if c.is_alphabetic() {
            out.push(c);
            last_was_space = false;
        }
    }

    out.trim_end().to_string()
}

fn contains_any(text: &str, keywords: &[String]) -> bool {
    let text = text.to_lowercase();
    keywords.iter().any(|k| text.contains(k.as_str()))
}

fn lowercase_all(keywords: &[String]) -> Vec<String> {
    keywords.iter().map(|k| k.to_lowercase()).collect()
}
