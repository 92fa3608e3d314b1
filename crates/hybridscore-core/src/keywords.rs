//! Embedding-ranked keyword extraction.
//!
//! Candidate unigrams and bigrams are ranked by the cosine similarity of
//! their embedding to the embedding of the whole text, and the top-N are
//! kept. Keywords come back lemmatised so they line up with the other
//! concept sources. Long texts only rank their most frequent phrases.

use std::collections::{BTreeMap, BTreeSet};

use crate::embedding::{cosine_similarity, Embedder};
use crate::error::ModelError;
use crate::text;

/// Most candidate phrases embedded and ranked per text.
pub const MAX_RANKED_PHRASES: usize = 256;

/// Unigram and bigram keyword candidates of a text, lemmatised.
pub fn candidate_phrases(input: &str) -> BTreeSet<String> {
    phrase_counts(input).into_keys().collect()
}

fn phrase_counts(input: &str) -> BTreeMap<String, usize> {
    let mut out = BTreeMap::new();
    for segment in text::segments(input) {
        let lemmas: Vec<Option<String>> = segment
            .iter()
            .map(|t| text::is_content_token(t).then(|| text::lemmatize(t)))
            .collect();

        for lemma in lemmas.iter().flatten() {
            if lemma.chars().count() > 2 {
                *out.entry(lemma.clone()).or_insert(0) += 1;
            }
        }
        for pair in lemmas.windows(2) {
            if let [Some(a), Some(b)] = pair {
                *out.entry(format!("{a} {b}")).or_insert(0) += 1;
            }
        }
    }
    out
}

/// Candidates in alphabetical order, cut down to the
/// [`MAX_RANKED_PHRASES`] most frequent ones.
fn ranked_candidates(input: &str) -> Vec<String> {
    let mut counted: Vec<(String, usize)> = phrase_counts(input).into_iter().collect();
    if counted.len() > MAX_RANKED_PHRASES {
        // Stable sort: equal counts keep their alphabetical order.
        counted.sort_by(|a, b| b.1.cmp(&a.1));
        counted.truncate(MAX_RANKED_PHRASES);
        counted.sort_by(|a, b| a.0.cmp(&b.0));
    }
    counted.into_iter().map(|(phrase, _)| phrase).collect()
}

/// The `top_n` candidates closest to the text as a whole.
pub fn extract_keywords(
    embedder: &dyn Embedder,
    input: &str,
    top_n: usize,
) -> Result<Vec<String>, ModelError> {
    if top_n == 0 {
        return Ok(Vec::new());
    }
    let candidates = ranked_candidates(input);
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let document = embedder.embed(input)?;
    let mut scored = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let score = cosine_similarity(&document, &embedder.embed(&candidate)?);
        scored.push((candidate, score));
    }

    // Candidates arrive in alphabetical order, so ties stay stable.
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    Ok(scored.into_iter().take(top_n).map(|(k, _)| k).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;

    #[test]
    fn candidates_respect_punctuation_and_stopwords() {
        let c = candidate_phrases("La varianza muestral, de la distribución normal.");
        assert!(c.contains("varianza"));
        assert!(c.contains("varianza muestral"));
        assert!(c.contains("distribucion normal"));
        assert!(!c.contains("muestral distribucion"));
        assert!(!c.iter().any(|k| k.split(' ').any(|w| w == "la")));
    }

    #[test]
    fn keywords_are_deterministic_and_bounded() {
        let embedder = HashingEmbedder::new(256);
        let text = "El valor esperado de un dado justo es la media de sus caras";
        let a = extract_keywords(&embedder, text, 3).unwrap();
        let b = extract_keywords(&embedder, text, 3).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn long_texts_rank_only_frequent_phrases() {
        let mut words: Vec<String> = (0..400).map(|i| format!("termino{i:03}")).collect();
        words.extend(std::iter::repeat("varianza".to_string()).take(5));
        let text = words.join(". ");

        assert!(candidate_phrases(&text).len() > MAX_RANKED_PHRASES);
        let ranked = ranked_candidates(&text);
        assert_eq!(ranked.len(), MAX_RANKED_PHRASES);
        assert!(ranked.contains(&"varianza".to_string()));
        assert!(ranked.windows(2).all(|w| w[0] < w[1]));

        let embedder = HashingEmbedder::new(64);
        let keywords = extract_keywords(&embedder, &text, 8).unwrap();
        assert_eq!(keywords.len(), 8);
        assert!(keywords.iter().all(|k| ranked.contains(k)));
    }

    #[test]
    fn no_candidates_no_keywords() {
        let embedder = HashingEmbedder::new(32);
        assert!(extract_keywords(&embedder, "5", 4).unwrap().is_empty());
        assert!(extract_keywords(&embedder, "de la", 4).unwrap().is_empty());
        assert!(extract_keywords(&embedder, "varianza", 0).unwrap().is_empty());
    }
}
