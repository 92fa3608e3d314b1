//! Text normalisation shared by the analyzers.
//!
//! Everything downstream compares accent-stripped, lower-cased forms so that
//! "Probabilidad", "probabilidad" and "probabilídad" collapse to one concept.

use std::collections::HashSet;
use std::sync::LazyLock;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lower-case and strip diacritics (NFD, then drop combining marks).
pub fn fold(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Fold, replace punctuation with spaces and collapse whitespace.
pub fn normalize(text: &str) -> String {
    let folded: String = fold(text)
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalised word tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Token runs separated by punctuation. Used for phrase chunking, where a
/// comma or full stop must break a phrase even if no stop-word does.
pub fn segments(text: &str) -> Vec<Vec<String>> {
    let mut out = Vec::new();
    let mut segment = Vec::new();
    let mut word = String::new();

    for c in fold(text).chars() {
        if c.is_alphanumeric() {
            word.push(c);
            continue;
        }
        if !word.is_empty() {
            segment.push(std::mem::take(&mut word));
        }
        if !c.is_whitespace() && !segment.is_empty() {
            out.push(std::mem::take(&mut segment));
        }
    }
    if !word.is_empty() {
        segment.push(word);
    }
    if !segment.is_empty() {
        out.push(segment);
    }
    out
}

static STOPWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        // articles, determiners
        "el", "la", "los", "las", "un", "una", "unos", "unas", "lo", "al", "del",
        "este", "esta", "estos", "estas", "ese", "esa", "esos", "esas", "aquel",
        "aquella", "esto", "eso", "cada", "todo", "toda", "todos", "todas", "otro",
        "otra", "otros", "otras", "mismo", "misma", "cual", "cuales", "cuyo",
        // prepositions, conjunctions
        "a", "ante", "bajo", "con", "contra", "de", "desde", "durante", "en",
        "entre", "hacia", "hasta", "mediante", "para", "por", "segun", "sin",
        "sobre", "tras", "y", "e", "o", "u", "ni", "que", "pero", "sino", "si",
        "como", "cuando", "donde", "mientras", "aunque", "pues", "porque",
        // pronouns
        "yo", "tu", "el", "ella", "ello", "nosotros", "vosotros", "ellos",
        "ellas", "me", "te", "se", "nos", "os", "le", "les", "mi", "mis", "su",
        "sus", "nuestro", "nuestra", "usted", "ustedes", "quien", "quienes",
        // auxiliaries and very common verbs
        "es", "son", "ser", "era", "eran", "fue", "fueron", "sea", "sean", "sido",
        "esta", "estan", "estar", "estaba", "ha", "han", "he", "hay", "haber",
        "habia", "tiene", "tienen", "tener", "tengo", "puede", "pueden", "poder",
        "hace", "hacer", "debe", "deben", "va", "van", "vamos", "da", "dar",
        // adverbs and fillers
        "no", "mas", "menos", "muy", "ya", "tambien", "solo", "aqui", "asi",
        "entonces", "luego", "despues", "antes", "bien", "mal", "siempre",
        "nunca", "tan", "tanto", "aproximadamente", "casi", "respuesta",
        "idea",
        // english function words that leak into mixed answers
        "the", "of", "and", "to", "in", "is", "are", "for", "with", "on", "an",
    ]
    .into_iter()
    .collect()
});

/// Whether a normalised token is a stop-word.
pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}

/// A token that can carry a concept: not a stop-word, longer than one
/// character, and containing at least one letter.
pub fn is_content_token(token: &str) -> bool {
    token.chars().count() > 1
        && token.chars().any(char::is_alphabetic)
        && !is_stopword(token)
}

/// Light Spanish singulariser. Not a real lemmatiser; it only undoes the
/// regular plural forms so singular and plural mentions meet.
pub fn lemmatize(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    let n = chars.len();
    if n <= 3 || !token.chars().all(char::is_alphabetic) {
        return token.to_string();
    }

    if token.ends_with("iones") {
        return format!("{}ion", &token[..token.len() - 5]);
    }
    if token.ends_with("ces") && n > 4 {
        return format!("{}z", &token[..token.len() - 3]);
    }
    if token.ends_with("es") && n > 4 {
        let stem_last = chars[n - 3];
        let before = chars[n - 4];
        if "lrndjy".contains(stem_last) && is_vowel(before) {
            return token[..token.len() - 2].to_string();
        }
    }
    if token.ends_with("is") || token.ends_with("us") {
        return token.to_string();
    }
    if token.ends_with('s') && is_vowel(chars[n - 2]) {
        return token[..token.len() - 1].to_string();
    }
    token.to_string()
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Adverbs, gerunds, infinitives and first-person plurals: tokens that are
/// unlikely to name a thing.
pub fn looks_like_verb(token: &str) -> bool {
    let n = token.chars().count();
    if token.ends_with("mente") || token.ends_with("ando") || token.ends_with("iendo") {
        return true;
    }
    if n > 5 && (token.ends_with("amos") || token.ends_with("emos") || token.ends_with("imos")) {
        return true;
    }
    n > 4 && (token.ends_with("ar") || token.ends_with("er") || token.ends_with("ir"))
}
