//! Keyword sentiment for news headlines.
//!
//! Case-insensitive substring match against two fixed word lists. The
//! positive list is checked first, so a headline containing words from both
//! lists scores positive.

use std::fmt;

pub const POSITIVE_KEYWORDS: &[&str] = &[
    "beat",
    "record",
    "surge",
    "upgrade",
    "approval",
    "approved",
    "soar",
    "jump",
    "rally",
    "partnership",
    "breakthrough",
    "raises guidance",
    "buyback",
    "contract",
];

pub const NEGATIVE_KEYWORDS: &[&str] = &[
    "miss",
    "drop",
    "lawsuit",
    "downgrade",
    "plunge",
    "fall",
    "probe",
    "offering",
    "bankruptcy",
    "recall",
    "delist",
    "halt",
];

pub const SENTIMENT_WEIGHT: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentiment {
    pub score: i32,
    pub label: SentimentLabel,
    pub keyword: Option<&'static str>,
}

impl Sentiment {
    pub fn neutral() -> Self {
        Self {
            score: 0,
            label: SentimentLabel::Neutral,
            keyword: None,
        }
    }
}

fn first_match(title: &str, keywords: &[&'static str]) -> Option<&'static str> {
    keywords.iter().copied().find(|k| title.contains(k))
}

pub fn tag(headline: &str) -> Sentiment {
    let title = headline.to_lowercase();

    if let Some(keyword) = first_match(&title, POSITIVE_KEYWORDS) {
        return Sentiment {
            score: SENTIMENT_WEIGHT,
            label: SentimentLabel::Positive,
            keyword: Some(keyword),
        };
    }
    if let Some(keyword) = first_match(&title, NEGATIVE_KEYWORDS) {
        return Sentiment {
            score: -SENTIMENT_WEIGHT,
            label: SentimentLabel::Negative,
            keyword: Some(keyword),
        };
    }
    Sentiment::neutral()
}
