//! Header-to-synonym scoring.
//!
//! | Relation                              | Score |
//! |---------------------------------------|-------|
//! | normalized texts equal                | 1.0   |
//! | header contains the synonym (words)   | 0.9   |
//! | otherwise: token overlap              | `weight / (2 × max(n₁, n₂))` |
//!
//! In the token overlap each header token contributes 2 when it equals a
//! synonym token and 1 when one is a substring of the other.

use censo_model::MatchMethod;

use crate::utils::tokens;

pub const EXACT_SCORE: f64 = 1.0;
pub const CONTAINS_SCORE: f64 = 0.9;

const EXACT_TOKEN_WEIGHT: f64 = 2.0;
const PARTIAL_TOKEN_WEIGHT: f64 = 1.0;

/// Best match of one header against a field's synonyms.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderScore {
    pub score: f64,
    pub method: MatchMethod,
    pub synonym: String,
}

/// Scores a normalized header against one normalized synonym.
pub fn score_header(header: &str, synonym: &str) -> (f64, MatchMethod) {
    if header.is_empty() || synonym.is_empty() {
        return (0.0, MatchMethod::TokenOverlap);
    }
    if header == synonym {
        return (EXACT_SCORE, MatchMethod::Exact);
    }
    if contains_words(header, synonym) {
        return (CONTAINS_SCORE, MatchMethod::Contains);
    }
    (token_overlap(header, synonym), MatchMethod::TokenOverlap)
}

/// Highest-scoring synonym; the earliest synonym wins ties.
pub fn best_score(header: &str, synonyms: &[String]) -> Option<HeaderScore> {
    let mut best: Option<HeaderScore> = None;
    for synonym in synonyms {
        let (score, method) = score_header(header, synonym);
        if score <= 0.0 {
            continue;
        }
        if best.as_ref().is_none_or(|current| score > current.score) {
            best = Some(HeaderScore {
                score,
                method,
                synonym: synonym.clone(),
            });
        }
    }
    best
}

/// Token overlap score in `[0, 1]`.
pub fn token_overlap(left: &str, right: &str) -> f64 {
    let left_tokens = tokens(left);
    let right_tokens = tokens(right);
    let longest = left_tokens.len().max(right_tokens.len());
    if longest == 0 {
        return 0.0;
    }
    let mut weight = 0.0;
    for token in &left_tokens {
        let mut token_weight: f64 = 0.0;
        for other in &right_tokens {
            if token == other {
                token_weight = EXACT_TOKEN_WEIGHT;
                break;
            }
            if other.contains(token) || token.contains(other) {
                token_weight = token_weight.max(PARTIAL_TOKEN_WEIGHT);
            }
        }
        weight += token_weight;
    }
    weight / (2.0 * longest as f64)
}

fn contains_words(header: &str, synonym: &str) -> bool {
    format!(" {header} ").contains(&format!(" {synonym} "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_scores_one() {
        assert_eq!(
            score_header("fecha de ingreso", "fecha de ingreso"),
            (1.0, MatchMethod::Exact)
        );
    }

    #[test]
    fn containment_respects_word_boundaries() {
        assert_eq!(
            score_header("salario diario integrado", "salario diario"),
            (0.9, MatchMethod::Contains)
        );
        let (score, method) = score_header("sdi", "sd");
        assert_eq!(method, MatchMethod::TokenOverlap);
        assert!(score < 0.7);
    }

    #[test]
    fn token_overlap_counts_exact_double() {
        // fecha(2) + de(2) + ingreso/nacimiento(0) over 2 * 3
        let score = token_overlap("fecha de ingreso", "fecha de nacimiento");
        assert!((score - 4.0 / 6.0).abs() < 1e-9);
        // f/fec partial(1) + nac(2) over 2 * 2
        let score = token_overlap("f nac", "fec nac");
        assert!((score - 0.75).abs() < 1e-9);
    }

    #[test]
    fn token_overlap_is_bounded() {
        assert!(token_overlap("de de de", "de") <= 1.0);
        assert_eq!(token_overlap("", "rfc"), 0.0);
    }

    #[test]
    fn best_score_prefers_higher_then_earlier() {
        let synonyms = vec!["fecha alta".to_string(), "fecha de ingreso".to_string()];
        let best = best_score("fecha de ingreso", &synonyms).unwrap();
        assert_eq!(best.synonym, "fecha de ingreso");
        assert_eq!(best.method, MatchMethod::Exact);
        assert!(best_score("zzz", &synonyms).is_none());
    }
}
