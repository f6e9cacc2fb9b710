//! Word-list sentiment scoring (AFINN-style, integer weights in -5..=5).

use std::collections::HashMap;

use async_trait::async_trait;

use ingestor_core::error::{IngestError, Result};

use super::Analyzer;

const BUILTIN_WORDS: &[(&str, i32)] = &[
    ("abandon", -2),
    ("amazing", 4),
    ("angry", -3),
    ("annoyed", -2),
    ("awesome", 4),
    ("awful", -3),
    ("bad", -3),
    ("beautiful", 3),
    ("best", 3),
    ("boring", -3),
    ("breakdown", -2),
    ("broken", -1),
    ("calm", 2),
    ("catastrophic", -4),
    ("cheerful", 2),
    ("clean", 2),
    ("cold", -1),
    ("comfortable", 2),
    ("crash", -2),
    ("damage", -3),
    ("danger", -2),
    ("dead", -3),
    ("delight", 3),
    ("disaster", -2),
    ("dislike", -2),
    ("enjoy", 2),
    ("excellent", 3),
    ("fail", -2),
    ("failure", -2),
    ("fantastic", 4),
    ("fault", -2),
    ("fine", 2),
    ("fun", 4),
    ("glad", 3),
    ("good", 3),
    ("great", 3),
    ("happy", 3),
    ("harm", -2),
    ("hate", -3),
    ("help", 2),
    ("hope", 2),
    ("horrible", -3),
    ("hot", -1),
    ("hurt", -2),
    ("ideal", 2),
    ("like", 2),
    ("love", 3),
    ("lucky", 3),
    ("nice", 3),
    ("ok", 1),
    ("outstanding", 5),
    ("pain", -2),
    ("perfect", 3),
    ("pleasant", 3),
    ("poor", -2),
    ("problem", -2),
    ("recommend", 2),
    ("reliable", 2),
    ("sad", -2),
    ("safe", 1),
    ("slow", -2),
    ("smooth", 2),
    ("sorry", -1),
    ("stable", 2),
    ("stuck", -2),
    ("success", 2),
    ("superb", 5),
    ("terrible", -3),
    ("thanks", 2),
    ("thank", 2),
    ("ugly", -3),
    ("unhappy", -2),
    ("warm", 1),
    ("warning", -3),
    ("win", 4),
    ("wonderful", 4),
    ("worse", -3),
    ("worst", -3),
    ("wrong", -2),
];

/// Words that flip the sign of the word right after them.
const NEGATORS: &[&str] = &[
    "not", "no", "never", "dont", "don't", "isnt", "isn't", "cant", "can't", "wont",
    "won't", "doesnt", "doesn't", "didnt", "didn't", "wasnt", "wasn't", "without",
];

pub struct LexiconAnalyzer {
    words: HashMap<String, i32>,
}

impl LexiconAnalyzer {
    pub fn new() -> Self {
        Self {
            words: BUILTIN_WORDS.iter().map(|(w, s)| (w.to_string(), *s)).collect(),
        }
    }

    /// Built-in list plus `extra` entries; extra entries win on conflict.
    pub fn with_extra(extra: &HashMap<String, i32>) -> Self {
        let mut a = Self::new();
        for (w, s) in extra {
            a.words.insert(w.to_lowercase(), *s);
        }
        a
    }

    pub fn score_text(&self, text: &str) -> Result<i64> {
        if text.contains('\0') {
            return Err(IngestError::Analysis("text contains NUL characters".into()));
        }

        let lower = text.to_lowercase();
        let mut score: i64 = 0;
        let mut negate = false;
        for token in lower
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|t| !t.is_empty())
        {
            if let Some(s) = self.words.get(token) {
                let s = i64::from(*s);
                score += if negate { -s } else { s };
            }
            negate = NEGATORS.contains(&token);
        }
        Ok(score)
    }
}

impl Default for LexiconAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Analyzer for LexiconAnalyzer {
    async fn score(&self, text: &str) -> Result<f64> {
        Ok(self.score_text(text)? as f64)
    }
}
