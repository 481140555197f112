//! Topic suggestions derived from past queries

use std::collections::HashSet;

use crate::history::HistoryEntry;

/// Topics that can be suggested
pub const TOPIC_VOCABULARY: &[&str] = &[
    "Python",
    "AI",
    "Groq",
    "LangChain",
    "Streamlit",
    "Rust",
    "JavaScript",
    "Blockchain",
    "Cloud",
    "Robotics",
];

/// Outcome of a recommendation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recommendations {
    /// Nothing has been asked yet
    NoHistory,
    /// Matching topics in vocabulary order; empty when nothing matched
    Topics(Vec<&'static str>),
}

impl Recommendations {
    /// Matched topics, empty for `NoHistory`
    #[must_use]
    pub fn topics(&self) -> &[&'static str] {
        match self {
            Self::NoHistory => &[],
            Self::Topics(topics) => topics,
        }
    }
}

/// Suggest vocabulary topics whose name appears as a whole word in any past query
#[must_use]
pub fn recommend(history: &[HistoryEntry]) -> Recommendations {
    if history.is_empty() {
        return Recommendations::NoHistory;
    }

    let words: HashSet<String> = history
        .iter()
        .flat_map(|entry| tokenize(&entry.query))
        .collect();

    Recommendations::Topics(
        TOPIC_VOCABULARY
            .iter()
            .copied()
            .filter(|topic| words.contains(&topic.to_lowercase()))
            .collect(),
    )
}

/// Lower-cased alphanumeric runs
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}
