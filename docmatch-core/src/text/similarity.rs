//! Multi-signal similarity between two cleaned texts.
//!
//! Each scorer is an independent function returning a value in [0, 1]. The final score is
//! the maximum across scorers, so one robust signal is enough to recognise a pair even
//! when another signal is fooled by an extraction artifact.

use super::tokenizer::{canonical_operator, Token};
use super::NormalizedText;
use crate::types::Entity;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;

const JACCARD_WEIGHT: f64 = 0.8;
const CLOSENESS_WEIGHT: f64 = 0.2;
const LHS_AGREEMENT_BONUS: f64 = 0.1;
const PARTIAL_RATIO_WEIGHT: f64 = 0.9;
const TOKEN_RATIO_WEIGHT: f64 = 0.95;
const VARIABLE_WEIGHT: f64 = 0.7;
const OPERATOR_WEIGHT: f64 = 0.3;
const MAX_VARIABLE_RUN: usize = 2;
const MIN_CONTEXT_WORD: usize = 3;
const MAX_PARTIAL_NEEDLE: usize = 64;

/// Every signal computed for one pair, kept for audit output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarityBreakdown {
    pub exact: bool,
    pub jaccard: f64,
    pub ratio: f64,
    pub partial_ratio: f64,
    pub token_sort: f64,
    pub token_set: f64,
    pub weighted: f64,
    pub structural: f64,
    pub best: f64,
}

impl SimilarityBreakdown {
    /// Name of the signal that produced `best`.
    pub fn strongest_signal(&self) -> &'static str {
        if self.exact {
            return "exact tokens";
        }
        let signals = [
            ("token jaccard", self.jaccard),
            ("ratio", self.ratio),
            ("partial ratio", self.partial_ratio),
            ("token sort", self.token_sort),
            ("token set", self.token_set),
            ("weighted ratio", self.weighted),
            ("structure", self.structural),
        ];
        signals
            .iter()
            .fold(("none", 0.0), |best, &(name, score)| {
                if score > best.1 {
                    (name, score)
                } else {
                    best
                }
            })
            .0
    }
}

/// Similarity of two cleaned texts, in [0, 1].
pub fn similarity(a: &str, b: &str) -> f64 {
    score_normalized(&NormalizedText::from_cleaned(a), &NormalizedText::from_cleaned(b)).best
}

pub fn score_normalized(a: &NormalizedText, b: &NormalizedText) -> SimilarityBreakdown {
    if !a.tokens.is_empty() && a.tokens == b.tokens {
        return SimilarityBreakdown {
            exact: true,
            jaccard: 1.0,
            ratio: 1.0,
            partial_ratio: 1.0,
            token_sort: 1.0,
            token_set: 1.0,
            weighted: 1.0,
            structural: 1.0,
            best: 1.0,
        };
    }

    let jaccard = jaccard_score(&a.tokens, &b.tokens);
    let ratio = ratio(&a.cleaned_text, &b.cleaned_text);
    let partial_ratio = partial_ratio(&a.cleaned_text, &b.cleaned_text);
    let token_sort = token_sort_ratio(&a.cleaned_text, &b.cleaned_text);
    let token_set = token_set_ratio(&a.cleaned_text, &b.cleaned_text);
    let weighted = ratio
        .max(PARTIAL_RATIO_WEIGHT * partial_ratio)
        .max(TOKEN_RATIO_WEIGHT * token_sort)
        .max(TOKEN_RATIO_WEIGHT * token_set);
    let structural = structural_score(&a.cleaned_text, &b.cleaned_text);

    let best = [jaccard, ratio, partial_ratio, token_sort, token_set, weighted, structural]
        .into_iter()
        .fold(0.0_f64, f64::max)
        .clamp(0.0, 1.0);

    SimilarityBreakdown {
        exact: false,
        jaccard,
        ratio,
        partial_ratio,
        token_sort,
        token_set,
        weighted,
        structural,
        best,
    }
}

fn set_jaccard<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

fn left_hand_side(tokens: &[Token]) -> HashSet<&Token> {
    tokens
        .iter()
        .take_while(|t| **t != Token::Operator('='))
        .collect()
}

/// Token-set overlap, boosted by length closeness and by agreement on the left-hand side.
pub fn jaccard_score(a: &[Token], b: &[Token]) -> f64 {
    let set_a: HashSet<&Token> = a.iter().collect();
    let set_b: HashSet<&Token> = b.iter().collect();
    let jaccard = set_jaccard(&set_a, &set_b);
    if jaccard == 0.0 {
        return 0.0;
    }

    let closeness = a.len().min(b.len()) as f64 / a.len().max(b.len()) as f64;
    let mut score = JACCARD_WEIGHT * jaccard + CLOSENESS_WEIGHT * closeness;

    let has_relation = |tokens: &[Token]| tokens.contains(&Token::Operator('='));
    if has_relation(a) && has_relation(b) {
        let lhs_a = left_hand_side(a);
        let lhs_b = left_hand_side(b);
        if lhs_a.intersection(&lhs_b).next().is_some() {
            score += LHS_AGREEMENT_BONUS;
        }
    }
    score.min(1.0)
}

/// Normalized edit similarity of the lower-cased texts.
pub fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase())
}

/// Best ratio of the shorter text against every equally long window of the longer one.
/// Scores 0 when the shorter text exceeds `MAX_PARTIAL_NEEDLE` characters; the other
/// scorers still cover such pairs.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.len() > MAX_PARTIAL_NEEDLE {
        return 0.0;
    }
    let needle: String = short.iter().collect();

    long.windows(short.len())
        .map(|window| {
            let window: String = window.iter().collect();
            strsim::normalized_levenshtein(&needle, &window)
        })
        .fold(0.0, f64::max)
}

fn sorted_words(text: &str) -> Vec<String> {
    let mut words: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
    words.sort();
    words
}

/// Ratio after sorting whitespace-separated words.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_words(a).join(" "), &sorted_words(b).join(" "))
}

/// Ratio on the shared word set against each side's shared-plus-remaining words.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let words_a: HashSet<String> = sorted_words(a).into_iter().collect();
    let words_b: HashSet<String> = sorted_words(b).into_iter().collect();
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }

    let sorted_join = |set: Vec<&String>| {
        let mut words: Vec<&str> = set.into_iter().map(String::as_str).collect();
        words.sort_unstable();
        words.join(" ")
    };
    let shared = sorted_join(words_a.intersection(&words_b).collect());
    let only_a = sorted_join(words_a.difference(&words_b).collect());
    let only_b = sorted_join(words_b.difference(&words_a).collect());

    let combine = |rest: &str| match (shared.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (false, true) => shared.clone(),
        (false, false) => format!("{shared} {rest}"),
    };
    let combined_a = combine(&only_a);
    let combined_b = combine(&only_b);

    ratio(&shared, &combined_a)
        .max(ratio(&shared, &combined_b))
        .max(ratio(&combined_a, &combined_b))
}

fn variable_letters(text: &str) -> HashSet<char> {
    let mut letters = HashSet::new();
    let mut run: Vec<char> = Vec::new();
    let flush = |run: &mut Vec<char>, letters: &mut HashSet<char>| {
        if run.len() <= MAX_VARIABLE_RUN {
            letters.extend(run.iter().copied());
        }
        run.clear();
    };
    for c in text.chars() {
        if c.is_alphabetic() {
            run.push(c);
        } else {
            flush(&mut run, &mut letters);
        }
    }
    flush(&mut run, &mut letters);
    letters
}

fn operator_set(text: &str) -> HashSet<char> {
    text.chars().filter_map(canonical_operator).collect()
}

/// Overlap of variable names (single letters and two-letter products) and operator sets.
pub fn structural_score(a: &str, b: &str) -> f64 {
    VARIABLE_WEIGHT * set_jaccard(&variable_letters(a), &variable_letters(b))
        + OPERATOR_WEIGHT * set_jaccard(&operator_set(a), &operator_set(b))
}

fn context_words(entity: &Entity) -> HashSet<String> {
    format!("{} {}", entity.context_before, entity.context_after)
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| w.chars().count() >= MIN_CONTEXT_WORD)
        .map(str::to_lowercase)
        .collect()
}

/// Word overlap of the text surrounding two entities, in [0, 1].
pub fn context_overlap(a: &Entity, b: &Entity) -> f64 {
    set_jaccard(&context_words(a), &context_words(b))
}
