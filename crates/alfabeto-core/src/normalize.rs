//! Answer and lookup-key normalization.
//!
//! Learners type with arbitrary case and stray spaces. Answers are compared
//! after [`normalize_answer`]; accents only stop mattering when the accepted
//! set itself lists a word both with and without them. Table keys (prompts,
//! patterns, syllable fragments) are matched through [`comparison_key`],
//! which also folds accents.

use unicode_normalization::UnicodeNormalization;

/// Trim, collapse inner whitespace runs to one space and uppercase.
pub fn normalize_answer(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Strip combining marks so that `ÁRVORE` and `ARVORE` compare equal.
pub fn fold_accents(s: &str) -> String {
    s.nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .nfc()
        .collect()
}

/// Key used for table lookups by prompt text.
pub fn comparison_key(s: &str) -> String {
    fold_accents(&normalize_answer(s))
}

/// Returns `true` if `answer` is one of `candidates` after normalization.
///
/// An answer spelled with different accents than a candidate only matches
/// when the candidates hold that word both accented and unaccented
/// (`LEÃO` and `LEAO`). Otherwise accents are significant: `AVÔ` is not
/// `AVÓ`.
pub fn matches_any<I, S>(candidates: I, answer: &str) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let answer = normalize_answer(answer);
    if answer.is_empty() {
        return false;
    }
    let candidates: Vec<String> = candidates
        .into_iter()
        .map(|c| normalize_answer(c.as_ref()))
        .collect();
    if candidates.contains(&answer) {
        return true;
    }

    let folded = fold_accents(&answer);
    candidates.iter().any(|candidate| {
        let bare = fold_accents(candidate);
        bare != *candidate && bare == folded && candidates.contains(&bare)
    })
}

/// Split a syllable prompt such as `"CA e SA"` or `"BO + LA"` into fragments.
///
/// Separators (`+`, `&`, `,`, `-`) are dropped, and so is a lowercase `e`
/// standing between two fragments. An uppercase `E` is a syllable:
/// `"E e LA"` is `["E", "LA"]`. Fragments are returned uppercased with
/// their accents.
pub fn syllable_fragments(prompt: &str) -> Vec<String> {
    let tokens: Vec<&str> = prompt
        .split(|c: char| c.is_whitespace() || matches!(c, '+' | ',' | '&' | '-'))
        .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|token| !token.is_empty())
        .collect();

    let last = tokens.len().saturating_sub(1);
    tokens
        .iter()
        .enumerate()
        .filter(|&(i, token)| !(*token == "e" && i > 0 && i < last))
        .map(|(_, token)| normalize_answer(token))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_uppercases() {
        assert_eq!(normalize_answer("  Redondo "), "REDONDO");
        assert_eq!(normalize_answer("eu  gosto\tde ler"), "EU GOSTO DE LER");
        assert_eq!(normalize_answer("   "), "");
    }

    #[test]
    fn fold_removes_accents_and_cedilla() {
        assert_eq!(fold_accents("MAÇÃ"), "MACA");
        assert_eq!(fold_accents("ÁRVORE"), "ARVORE");
        assert_eq!(fold_accents("LEÃO"), "LEAO");
        assert_eq!(fold_accents("BOLA"), "BOLA");
    }

    #[test]
    fn comparison_key_is_case_and_accent_insensitive() {
        assert_eq!(comparison_key(" maçã "), comparison_key("MACA"));
        assert_eq!(comparison_key("O que é uma bola?"), "O QUE E UMA BOLA?");
    }

    #[test]
    fn matches_any_keeps_accents_significant() {
        assert!(matches_any(["AVÔ"], "avô"));
        assert!(!matches_any(["AVÔ"], "AVÓ"));
        assert!(!matches_any(["MAÇÃ"], "MACA"));
        assert!(!matches_any(["É"], "E"));
    }

    #[test]
    fn matches_any_folds_words_listed_both_ways() {
        let animals = ["GATO", "LEÃO", "LEAO"];
        assert!(matches_any(animals, "leao"));
        assert!(matches_any(animals, "leão"));
        assert!(matches_any(animals, "LEÂO"));
        assert!(!matches_any(animals, "GÀTO"));
    }

    #[test]
    fn matches_any_rejects_empty_answer() {
        assert!(!matches_any(["A"], "   "));
        assert!(matches_any(["A"], " a "));
        assert!(!matches_any(Vec::<String>::new(), "A"));
    }

    #[test]
    fn syllable_fragments_drop_connectors() {
        assert_eq!(syllable_fragments("CA e SA"), vec!["CA", "SA"]);
        assert_eq!(syllable_fragments("bo + la"), vec!["BO", "LA"]);
        assert_eq!(syllable_fragments("MA, CA, CO"), vec!["MA", "CA", "CO"]);
        assert_eq!(syllable_fragments("CO-RA-ÇÃO"), vec!["CO", "RA", "ÇÃO"]);
        assert_eq!(syllable_fragments("BA"), vec!["BA"]);
    }

    #[test]
    fn syllable_fragments_keep_vowel_e() {
        assert_eq!(syllable_fragments("E e LA"), vec!["E", "LA"]);
        assert_eq!(syllable_fragments("E + LE + FAN + TE"), vec!["E", "LE", "FAN", "TE"]);
        assert_eq!(syllable_fragments("e e la"), vec!["E", "LA"]);
        assert_eq!(syllable_fragments("LE + FAN + TE"), vec!["LE", "FAN", "TE"]);
    }
}
