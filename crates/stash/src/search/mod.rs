//! Fuzzy multi-term search over collected posts.
//!
//! Pure functions: no I/O, no shared state, safe to call concurrently.

use serde_json::Value;

use crate::types::SavedPost;

/// Minimum query length eligible for fuzzy matching. Shorter words only
/// match exactly - edit-distance similarity on short words produces too
/// many false positives.
const MIN_FUZZY_LEN: usize = 4;

/// Options for searching a collection.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// All terms must match (AND) when true; any term (OR) when false.
    pub match_all: bool,
    /// Edit-distance proxy; 0 disables fuzzy matching entirely.
    pub fuzzy_threshold: u32,
    /// Maximum results returned by [`filter_posts`].
    pub limit: Option<usize>,
    /// Reddit only: restrict to one subreddit before text matching.
    pub subreddit: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            match_all: true,
            fuzzy_threshold: 2,
            limit: None,
            subreddit: None,
        }
    }
}

/// Whether `text` matches the query terms.
///
/// Text and queries are lowercased and tokenized on whitespace. Each term
/// matches if any token equals it, or - when fuzzy matching is enabled and
/// the term is at least [`MIN_FUZZY_LEN`] characters - if any token's
/// similarity ratio reaches `100 - fuzzy_threshold * 10`. An empty query
/// list matches vacuously.
#[must_use]
pub fn matches(text: &str, queries: &[String], match_all: bool, fuzzy_threshold: u32) -> bool {
    if queries.is_empty() {
        return true;
    }

    let tokens: Vec<String> = text
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();

    let mut results = queries
        .iter()
        .map(|query| word_matches(&query.to_lowercase(), &tokens, fuzzy_threshold));

    if match_all {
        results.all(|matched| matched)
    } else {
        results.any(|matched| matched)
    }
}

/// Filter posts by content, with an optional subreddit pre-filter and
/// result limit.
#[must_use]
pub fn filter_posts(
    posts: &[SavedPost],
    queries: &[String],
    options: &SearchOptions,
) -> Vec<SavedPost> {
    let subreddit = options.subreddit.as_deref().map(str::to_lowercase);

    let mut results = Vec::new();
    for post in posts {
        if let Some(wanted) = &subreddit {
            let post_subreddit = post
                .metadata
                .get("subreddit")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_lowercase();
            if post_subreddit != *wanted {
                continue;
            }
        }

        if matches(
            &post.content,
            queries,
            options.match_all,
            options.fuzzy_threshold,
        ) {
            results.push(post.clone());
            if options.limit.is_some_and(|limit| results.len() >= limit) {
                break;
            }
        }
    }
    results
}

/// Whether a single query word appears in the token list, exactly or fuzzily.
fn word_matches(word: &str, tokens: &[String], fuzzy_threshold: u32) -> bool {
    let fuzzy_eligible = fuzzy_threshold > 0 && word.chars().count() >= MIN_FUZZY_LEN;
    let min_ratio = 100u32.saturating_sub(fuzzy_threshold * 10);

    for token in tokens {
        if word == token {
            return true;
        }
        if fuzzy_eligible && similarity_ratio(word, token) >= min_ratio {
            return true;
        }
    }
    false
}

/// Normalized Levenshtein similarity as a percentage (100 = identical).
fn similarity_ratio(a: &str, b: &str) -> u32 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 100;
    }
    let distance = levenshtein_distance(a, b).min(longest);
    ((longest - distance) * 100 / longest) as u32
}

/// Levenshtein edit distance over chars.
fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let len1 = s1.chars().count();
    let len2 = s2.chars().count();
    let mut matrix = vec![vec![0; len2 + 1]; len1 + 1];

    for (i, row) in matrix.iter_mut().enumerate().take(len1 + 1) {
        row[0] = i;
    }
    for (j, cell) in matrix[0].iter_mut().enumerate().take(len2 + 1) {
        *cell = j;
    }

    for (i, c1) in s1.chars().enumerate() {
        for (j, c2) in s2.chars().enumerate() {
            let cost = usize::from(c1 != c2);
            matrix[i + 1][j + 1] = (matrix[i][j + 1] + 1)
                .min(matrix[i + 1][j] + 1)
                .min(matrix[i][j] + cost);
        }
    }

    matrix[len1][len2]
}
