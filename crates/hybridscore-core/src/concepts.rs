//! Concept extraction and asymmetric coverage.
//!
//! A text's concept set is the union of four sources:
//!
//! 1. noun-phrase chunks: runs of two or more content words inside one
//!    punctuation segment, lemmatised;
//! 2. noun lemmas: single content words that do not look like verbs;
//! 3. the top-N embedding-ranked keywords (see [`crate::keywords`]);
//! 4. a token fallback: every non-stop-word token longer than one char.
//!
//! The first, second and fourth sources are pure text functions and can be
//! tested on their own. Coverage is measured against the reference set, so it
//! answers "how much of the expected vocabulary showed up".

use std::collections::{BTreeMap, BTreeSet, HashMap};

use strsim::normalized_levenshtein;

use crate::config::ConceptConfig;
use crate::embedding::Embedder;
use crate::error::ModelError;
use crate::keywords;
use crate::text;

/// Normalised concept strings. Equality is exact-string.
pub type ConceptSet = BTreeSet<String>;

const MAX_PHRASE_WORDS: usize = 4;

/// Multi-word chunks of consecutive content words.
///
/// Runs of two to four words are kept whole; longer runs are emitted as
/// overlapping bigrams.
pub fn noun_phrases(input: &str) -> ConceptSet {
    let mut out = ConceptSet::new();
    for segment in text::segments(input) {
        let mut run: Vec<String> = Vec::new();
        for token in segment.iter().map(String::as_str).chain(std::iter::once("")) {
            if text::is_content_token(token) && !text::looks_like_verb(token) {
                run.push(text::lemmatize(token));
                continue;
            }
            match run.len() {
                0 | 1 => {}
                n if n <= MAX_PHRASE_WORDS => {
                    out.insert(run.join(" "));
                }
                _ => out.extend(run.windows(2).map(|w| w.join(" "))),
            }
            run.clear();
        }
    }
    out
}

/// Single noun-like lemmas of at least three characters.
pub fn noun_lemmas(input: &str) -> ConceptSet {
    text::tokenize(input)
        .into_iter()
        .filter(|t| {
            text::is_content_token(t)
                && t.chars().count() >= 3
                && t.chars().all(char::is_alphabetic)
                && !text::looks_like_verb(t)
        })
        .map(|t| text::lemmatize(&t))
        .collect()
}

/// Stop-word-filtered tokens longer than one character.
pub fn token_concepts(input: &str) -> ConceptSet {
    text::tokenize(input)
        .into_iter()
        .filter(|t| t.chars().count() > 1 && !text::is_stopword(t))
        .collect()
}

/// Union of every concept source for one text.
pub fn extract_concepts(
    input: &str,
    embedder: &dyn Embedder,
    config: &ConceptConfig,
) -> Result<ConceptSet, ModelError> {
    let mut concepts = noun_phrases(input);
    concepts.extend(noun_lemmas(input));
    concepts.extend(keywords::extract_keywords(
        embedder,
        input,
        config.keyword_top_n,
    )?);
    concepts.extend(token_concepts(input));
    Ok(concepts)
}

/// Whether two concepts are close enough to count as the same idea.
pub fn fuzzy_match(a: &str, b: &str, config: &ConceptConfig) -> bool {
    if a == b {
        return true;
    }
    let (shorter, longer) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    if shorter.chars().count() >= config.min_substring_len && longer.contains(shorter) {
        return true;
    }
    normalized_levenshtein(a, b) > config.fuzzy_threshold
}

type Bigram = (char, char);

fn bigram_counts(s: &str) -> HashMap<Bigram, u32> {
    let chars: Vec<char> = s.chars().collect();
    let mut counts = HashMap::new();
    for pair in chars.windows(2) {
        *counts.entry((pair[0], pair[1])).or_insert(0) += 1;
    }
    counts
}

/// Fewest bigrams two strings of these lengths must share for their
/// normalised edit similarity to exceed `threshold`, or `None` when the
/// length difference alone rules it out.
///
/// Each edit destroys at most two bigrams, and a similarity above `t`
/// allows fewer than `(1 - t) * longest` edits.
fn required_bigrams(a: usize, b: usize, threshold: f64) -> Option<u32> {
    let longest = a.max(b);
    let slack = (1.0 - threshold) * longest as f64;
    // Rounded up so float noise can only widen the filter.
    let max_edits = (slack + 1e-9).ceil() as i64 - 1;
    if max_edits < 0 || a.abs_diff(b) as i64 > max_edits {
        return None;
    }
    let needed = (longest as i64 - 1 - 2 * max_edits).max(0);
    Some(needed as u32)
}

/// Bigram index over a candidate concept set. Only pairs that pass the
/// length and shared-bigram filters reach [`fuzzy_match`], which keeps
/// coverage close to linear for long answers.
struct FuzzyIndex<'a> {
    concepts: Vec<&'a str>,
    lengths: Vec<usize>,
    postings: HashMap<Bigram, Vec<(usize, u32)>>,
    by_length: BTreeMap<usize, Vec<usize>>,
    shared: Vec<u32>,
    touched: Vec<usize>,
}

impl<'a> FuzzyIndex<'a> {
    fn new(set: &'a ConceptSet) -> Self {
        let concepts: Vec<&str> = set.iter().map(String::as_str).collect();
        let lengths: Vec<usize> = concepts.iter().map(|c| c.chars().count()).collect();
        let mut postings: HashMap<Bigram, Vec<(usize, u32)>> = HashMap::new();
        let mut by_length: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (idx, concept) in concepts.iter().enumerate() {
            for (gram, count) in bigram_counts(concept) {
                postings.entry(gram).or_default().push((idx, count));
            }
            by_length.entry(lengths[idx]).or_default().push(idx);
        }
        let n = concepts.len();
        Self {
            concepts,
            lengths,
            postings,
            by_length,
            shared: vec![0; n],
            touched: Vec::new(),
        }
    }

    /// Whether any indexed concept fuzzily matches `concept`.
    fn any_match(&mut self, concept: &str, config: &ConceptConfig) -> bool {
        let len = concept.chars().count();
        if len < 2 {
            return self.concepts.iter().any(|c| fuzzy_match(concept, c, config));
        }

        for (gram, count) in bigram_counts(concept) {
            let Some(posting) = self.postings.get(&gram) else {
                continue;
            };
            for &(idx, other) in posting {
                if self.shared[idx] == 0 {
                    self.touched.push(idx);
                }
                self.shared[idx] += count.min(other);
            }
        }

        let threshold = config.fuzzy_threshold;
        let min_len = config.min_substring_len;
        let mut found = false;
        for &idx in &self.touched {
            let (shared, other) = (self.shared[idx], self.lengths[idx]);
            // A contained string brings all of its bigrams along.
            let containable = (other < len && other >= min_len && shared as usize + 1 >= other)
                || (len <= other && len >= min_len && shared as usize + 1 >= len);
            let similar = required_bigrams(len, other, threshold).is_some_and(|n| shared >= n);
            if (containable || similar) && fuzzy_match(concept, self.concepts[idx], config) {
                found = true;
                break;
            }
        }
        for idx in self.touched.drain(..) {
            self.shared[idx] = 0;
        }
        if found {
            return true;
        }

        // Pairs that can match without sharing a single bigram.
        self.by_length
            .iter()
            .filter(|(other, _)| {
                **other < 2 || required_bigrams(len, **other, threshold) == Some(0)
            })
            .flat_map(|(_, ids)| ids)
            .any(|&idx| fuzzy_match(concept, self.concepts[idx], config))
    }
}

/// Coverage of `reference` by `candidate`, in [0, 1].
///
/// Exact overlap is used unless fuzzy overlap is larger. When nothing
/// matches exactly but something matches fuzzily, the score is capped at
/// `fuzzy_floor_cap`.
pub fn coverage(reference: &ConceptSet, candidate: &ConceptSet, config: &ConceptConfig) -> f64 {
    if reference.is_empty() {
        return 0.0;
    }
    let total = reference.len() as f64;

    let mut index = FuzzyIndex::new(candidate);
    let (mut exact, mut fuzzy) = (0usize, 0usize);
    for concept in reference {
        if candidate.contains(concept) {
            exact += 1;
            fuzzy += 1;
        } else if index.any_match(concept, config) {
            fuzzy += 1;
        }
    }

    let score = if exact == 0 && fuzzy > 0 {
        (fuzzy as f64 / total).min(config.fuzzy_floor_cap)
    } else {
        exact.max(fuzzy) as f64 / total
    };
    score.clamp(0.0, 1.0)
}

/// Concept coverage of the reference answer by the candidate answer.
pub fn concept_coverage(
    reference: &str,
    candidate: &str,
    embedder: &dyn Embedder,
    config: &ConceptConfig,
) -> Result<f64, ModelError> {
    let reference = extract_concepts(reference, embedder, config)?;
    if reference.is_empty() {
        return Ok(0.0);
    }
    let candidate = extract_concepts(candidate, embedder, config)?;
    Ok(coverage(&reference, &candidate, config))
}
