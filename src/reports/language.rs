// src/reports/language.rs
//! Russian/English composition of page text.
//!
//! Each top-level block is given one language by `whatlang`, and all of its
//! words count for that language. Blocks detected as any other language, or
//! with no detectable language, are ignored. Words are `\w+` runs.

use once_cell::sync::Lazy;
use regex::Regex;
use whatlang::Lang;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("word regex is valid"));

/// Word totals per language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WordCounts {
    pub russian: usize,
    pub english: usize,
}

impl WordCounts {
    /// Counts one block of text.
    pub fn of_block(text: &str) -> Self {
        let words = WORD.find_iter(text).count();
        if words == 0 {
            return Self::default();
        }
        match whatlang::detect_lang(text) {
            Some(Lang::Rus) => Self {
                russian: words,
                english: 0,
            },
            Some(Lang::Eng) => Self {
                russian: 0,
                english: words,
            },
            _ => Self::default(),
        }
    }

    /// Sums the counts of every block.
    pub fn of_blocks<'a>(blocks: impl IntoIterator<Item = &'a str>) -> Self {
        blocks.into_iter().map(Self::of_block).fold(Self::default(), |acc, c| Self {
            russian: acc.russian + c.russian,
            english: acc.english + c.english,
        })
    }

    /// Percentages of the attributed words, rounded to two decimals.
    pub fn share(&self) -> LanguageShare {
        let total = self.russian + self.english;
        if total == 0 {
            return LanguageShare::default();
        }
        let pct = |n: usize| (n as f64 / total as f64 * 10_000.0).round() / 100.0;
        LanguageShare {
            russian_pct: pct(self.russian),
            english_pct: pct(self.english),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LanguageShare {
    pub russian_pct: f64,
    pub english_pct: f64,
}

/// One line of the language report.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageRow {
    pub title: String,
    pub url: String,
    pub author: String,
    pub share: LanguageShare,
}

/// English share descending, then Russian share descending.
pub fn sort_rows(rows: &mut [LanguageRow]) {
    rows.sort_by(|a, b| {
        b.share
            .english_pct
            .total_cmp(&a.share.english_pct)
            .then(b.share.russian_pct.total_cmp(&a.share.russian_pct))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn block_counts_for_its_detected_language() {
        assert_eq!(
            WordCounts::of_block("Этот документ описывает процесс развертывания нашего нового сервиса"),
            WordCounts {
                russian: 8,
                english: 0
            }
        );
        assert_eq!(
            WordCounts::of_block("The quarterly report covers our deployment process and the new monitoring setup"),
            WordCounts {
                russian: 0,
                english: 12
            }
        );
    }

    #[test]
    fn other_languages_are_not_attributed() {
        let french = "Bonjour tout le monde, je suis ici pour vous parler de notre nouveau projet";
        let ukrainian = "Це коротка нотатка про розгортання нашого нового сервісу і її наслідки";
        assert_eq!(WordCounts::of_block(french), WordCounts::default());
        assert_eq!(WordCounts::of_block(ukrainian), WordCounts::default());
        assert_eq!(WordCounts::of_block("2024 42"), WordCounts::default());
        assert_eq!(WordCounts::of_block(""), WordCounts::default());
    }

    #[test]
    fn shares_round_to_two_decimals() {
        let counts = WordCounts {
            russian: 2,
            english: 1,
        };
        assert_eq!(
            counts.share(),
            LanguageShare {
                russian_pct: 66.67,
                english_pct: 33.33
            }
        );
        assert_eq!(WordCounts::default().share(), LanguageShare::default());
    }

    #[test]
    fn rows_sort_by_english_then_russian() {
        let row = |title: &str, ru: f64, en: f64| LanguageRow {
            title: title.into(),
            url: String::new(),
            author: String::new(),
            share: LanguageShare {
                russian_pct: ru,
                english_pct: en,
            },
        };
        let mut rows = vec![row("a", 100.0, 0.0), row("b", 0.0, 0.0), row("c", 20.0, 80.0), row("d", 0.0, 100.0)];
        sort_rows(&mut rows);
        let order: Vec<_> = rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(order, vec!["d", "c", "a", "b"]);
    }
}
