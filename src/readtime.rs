//! Estimates how long an article takes to read. The estimate only depends on
//! the word counts of an [`ArticleBody`], so identical bodies always produce
//! identical estimates.

use std::fmt;

/// The assumed reading speed.
pub const WORDS_PER_MINUTE: usize = 200;

/// A labeled section of an article: an optional heading followed by the text
/// of each of its blocks. Blocks without text (e.g., images) are simply left
/// out or given as empty strings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Section {
    pub heading: Option<String>,
    pub text_blocks: Vec<String>,
}

/// The countable text of an article, segmented into [`Section`]s.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArticleBody(pub Vec<Section>);

impl ArticleBody {
    /// Counts the words of every heading and text block in the body.
    pub fn word_count(&self) -> usize {
        self.0
            .iter()
            .map(|section| {
                section.heading.as_deref().map_or(0, count_words)
                    + section
                        .text_blocks
                        .iter()
                        .map(|text| count_words(text))
                        .sum::<usize>()
            })
            .sum()
    }
}

/// Counts the runs of non-whitespace characters in `text`. Empty and
/// whitespace-only strings have no words.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// The estimated reading duration of an article, in whole minutes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReadTime(pub usize);

impl ReadTime {
    pub fn minutes(self) -> usize {
        self.0
    }
}

impl fmt::Display for ReadTime {
    /// Displays the estimate as e.g. `4 min`. Articles without any text read
    /// as `1 min` rather than `0 min`.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} min", self.0.max(1))
    }
}

/// Estimates the reading time of `body`, rounding partial minutes up. A body
/// without words yields zero minutes.
pub fn estimate(body: &ArticleBody) -> ReadTime {
    let words = body.word_count();
    ReadTime((words + WORDS_PER_MINUTE - 1) / WORDS_PER_MINUTE)
}
