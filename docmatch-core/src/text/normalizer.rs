//! Canonicalizes formula text so that two differently garbled renderings compare equal.
//!
//! The pipeline runs in a fixed order:
//! 1. symbol repair (look-alike letters, unit abbreviations)
//! 2. operator repair (minus/dot/times/division variants, doubled "=")
//! 3. structural repair (duplicated superscripts from nested markup, misplaced exponents)
//! 4. merged-ratio repair ("UI" -> "U/I")
//! 5. explanatory-tail truncation (units, clause words, duplicate groups, equation numbers)
//! 6. whitespace normalization
//!
//! Each step is a no-op when its pattern is absent. Passes repeat until the text stops
//! changing, so `normalize` is idempotent.

use super::tables::{
    lookup_char, lookup_str, CLAUSE_WORDS, COMMA_UNIT_LETTERS, CYRILLIC_LOOKALIKES,
    LETTERLIKE_SYMBOLS, MATH_ALPHANUMERIC_DIGITS, MATH_ALPHANUMERIC_LATIN,
    MISPLACED_EXPONENT_DIGITS, OPERATOR_SUBSTITUTIONS, RATIO_PAIRS, UNIT_ABBREVIATIONS,
    UNIT_TOKENS,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Which extraction pipeline produced a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextOrigin {
    /// Page-layout extraction: glyph substitution and ligature artifacts
    Layout,
    /// Object-tree extraction: structural duplication from nested markup
    ObjectTree,
}

const MAX_PASSES: usize = 8;

/// Longest all-look-alike Cyrillic run treated as variable names rather than a word.
const MAX_LOOKALIKE_RUN: usize = 2;

static UNIT_ABBREVIATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = UNIT_ABBREVIATIONS
        .iter()
        .map(|(unit, _)| regex::escape(unit))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{alternation})\b")).expect("unit abbreviation table is valid")
});

static REPEATED_EQUALS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"={2,}").expect("static regex"));

static MISPLACED_EXPONENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    let digits: String = MISPLACED_EXPONENT_DIGITS.iter().collect();
    Regex::new(&format!(r"(?s)^([{digits}])\s*([A-Z])\s*=(.*)$")).expect("static regex")
});

static UNIT_TAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    let units = UNIT_TOKENS
        .iter()
        .map(|unit| regex::escape(unit))
        .collect::<Vec<_>>()
        .join("|");
    let letters: String = COMMA_UNIT_LETTERS.iter().collect();
    Regex::new(&format!(
        r"(?:(?:\s*,\s*|\s+)(?:{units})|\s*,\s*[{letters}])(?:$|[^\p{{L}}\p{{N}}])"
    ))
    .expect("unit token table is valid")
});

static CLAUSE_TAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    let words = CLAUSE_WORDS.join("|");
    Regex::new(&format!(r"(?i)(?:(?:\s*,\s*|\s+)(?:{words})\b|\s+—\s+)"))
        .expect("clause word table is valid")
});

static EQUATION_NUMBER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\s+[(\[]\d+(?:\.\d+)?[)\]])+\s*$").expect("static regex")
});

static OPERATOR_SPACING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*([=+\-*/^<>≤≥≠≈])\s*").expect("static regex"));

static WHITESPACE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

/// Canonicalize raw extracted text. Never fails; text without any known artifact comes
/// back trimmed and otherwise unchanged.
pub fn normalize(raw: &str, origin: TextOrigin) -> String {
    let mut current = raw.trim().to_string();
    for _ in 0..MAX_PASSES {
        let next = normalize_pass(&current, origin);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// Comparison key used by exact matching: lower-cased, whitespace removed.
pub fn normalized_key(cleaned: &str) -> String {
    cleaned
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn normalize_pass(text: &str, origin: TextOrigin) -> String {
    let text = repair_symbols(text);
    let text = repair_operators(&text);
    let text = match origin {
        TextOrigin::ObjectTree => repair_duplicated_superscripts(&text),
        TextOrigin::Layout => text,
    };
    let text = repair_misplaced_exponent(&text);
    let text = repair_merged_ratios(&text);
    let text = truncate_explanatory_tail(&text, origin);
    normalize_whitespace(&text)
}

fn is_cyrillic(c: char) -> bool {
    ('\u{0400}'..='\u{04FF}').contains(&c)
}

fn fold_math_alphanumeric(c: char) -> Option<char> {
    let code = c as u32;
    if MATH_ALPHANUMERIC_LATIN.contains(&code) {
        let offset = (code - MATH_ALPHANUMERIC_LATIN.start()) % 52;
        let base = if offset < 26 { b'A' + offset as u8 } else { b'a' + (offset - 26) as u8 };
        return Some(base as char);
    }
    if MATH_ALPHANUMERIC_DIGITS.contains(&code) {
        let offset = (code - MATH_ALPHANUMERIC_DIGITS.start()) % 10;
        return Some((b'0' + offset as u8) as char);
    }
    None
}

/// Step 1: look-alike letters to plain Latin, Cyrillic unit abbreviations to Latin units.
pub fn repair_symbols(text: &str) -> String {
    let text = UNIT_ABBREVIATION_REGEX.replace_all(text, |caps: &regex::Captures| {
        let found = &caps[0];
        UNIT_ABBREVIATIONS
            .iter()
            .find(|(unit, _)| *unit == found)
            .map(|(_, latin)| latin.to_string())
            .unwrap_or_else(|| found.to_string())
    });

    let chars: Vec<char> = text.chars().collect();
    let mut result = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if is_cyrillic(c) {
            let end = chars[i..]
                .iter()
                .position(|&n| !is_cyrillic(n))
                .map_or(chars.len(), |offset| i + offset);
            push_cyrillic_run(&chars[i..end], &mut result);
            i = end;
            continue;
        }

        if let Some(folded) = fold_math_alphanumeric(c) {
            result.push(folded);
        } else if let Some(latin) = lookup_char(LETTERLIKE_SYMBOLS, c) {
            result.push(latin);
        } else {
            result.push(c);
        }
        i += 1;
    }
    result
}

/// Short runs spelled only with look-alikes are variable names ("ТС", "А") and become
/// Latin. Anything else is a word and keeps its letters.
fn push_cyrillic_run(run: &[char], out: &mut String) {
    let latin: Option<Vec<char>> = if run.len() <= MAX_LOOKALIKE_RUN {
        run.iter().map(|&c| lookup_char(CYRILLIC_LOOKALIKES, c)).collect()
    } else {
        None
    };
    match latin {
        Some(letters) => out.extend(letters),
        None => out.extend(run),
    }
}

/// Step 2: operator glyph variants to ASCII, superscript digits to "^n", "==" to "=".
pub fn repair_operators(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match lookup_str(OPERATOR_SUBSTITUTIONS, c) {
            Some(replacement) => result.push_str(replacement),
            None => result.push(c),
        }
    }
    REPEATED_EQUALS_REGEX.replace_all(&result, "=").into_owned()
}

fn digit_run(chars: &[char], start: usize) -> usize {
    let mut end = start;
    while end < chars.len() && chars[end].is_ascii_digit() {
        end += 1;
    }
    end
}

/// Object-tree text renders a superscript both linearly and in markup form ("c2c^2").
/// Collapses `<letter><digits><letter>^<digits>` with identical parts to `<letter>^<digits>`.
pub fn repair_duplicated_superscripts(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut result = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_alphabetic() {
            let digits_end = digit_run(&chars, i + 1);
            let has_digits = digits_end > i + 1;
            if has_digits
                && chars.get(digits_end) == Some(&c)
                && chars.get(digits_end + 1) == Some(&'^')
            {
                let exp_start = digits_end + 2;
                let exp_end = digit_run(&chars, exp_start);
                if chars[i + 1..digits_end] == chars[exp_start..exp_end] {
                    result.push(c);
                    result.push('^');
                    result.extend(&chars[exp_start..exp_end]);
                    i = exp_end;
                    continue;
                }
            }
        }
        result.push(c);
        i += 1;
    }
    result
}

/// A raised exponent sorted ahead of its line ("2E=mc") is moved back onto the trailing
/// variable ("E=mc^2"). Only fires when the right-hand side ends with a letter.
pub fn repair_misplaced_exponent(text: &str) -> String {
    let Some(caps) = MISPLACED_EXPONENT_REGEX.captures(text) else {
        return text.to_string();
    };
    let rhs = caps[3].trim_end();
    match rhs.chars().last() {
        Some(last) if last.is_ascii_alphabetic() => {
            format!("{}={}^{}", &caps[2], rhs, &caps[1])
        }
        _ => text.to_string(),
    }
}

/// Re-inserts the division in two adjacent capitals that denote a ratio: every pair in
/// the known list, plus any standalone pair sitting right before "=" or at the end.
pub fn repair_merged_ratios(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut result = String::with_capacity(text.len() + 2);
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let standalone_pair = i + 1 < chars.len()
            && c.is_ascii_uppercase()
            && chars[i + 1].is_ascii_uppercase()
            && (i == 0 || !chars[i - 1].is_alphanumeric())
            && chars.get(i + 2).map(|n| !n.is_alphanumeric()).unwrap_or(true);

        if standalone_pair {
            let pair: String = chars[i..i + 2].iter().collect();
            let rest = chars[i + 2..].iter().find(|n| !n.is_whitespace());
            let before_relation = matches!(rest, None | Some(&'='));
            if RATIO_PAIRS.contains(&pair.as_str()) || before_relation {
                result.push(c);
                result.push('/');
                result.push(chars[i + 1]);
                i += 2;
                continue;
            }
        }
        result.push(c);
        i += 1;
    }
    result
}

/// First match of `regex` in `rhs` that has formula content before it.
fn first_tail_start(regex: &Regex, rhs: &str) -> Option<usize> {
    regex
        .find_iter(rhs)
        .map(|m| m.start())
        .find(|&start| !rhs[..start].trim().is_empty())
}

/// Start of the second of two identical, directly adjacent parenthesized groups.
fn duplicate_group_start(rhs: &str) -> Option<usize> {
    let mut groups: Vec<(usize, usize)> = Vec::new();
    let mut depth = 0usize;
    let mut open_at = 0usize;
    for (pos, c) in rhs.char_indices() {
        match c {
            '(' => {
                if depth == 0 {
                    open_at = pos;
                }
                depth += 1;
            }
            ')' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    groups.push((open_at, pos + 1));
                }
            }
            _ => {}
        }
    }

    groups.windows(2).find_map(|pair| {
        let (first, second) = (pair[0], pair[1]);
        let adjacent = rhs[first.1..second.0].trim().is_empty();
        let same = rhs[first.0..first.1] == rhs[second.0..second.1];
        let has_content = !rhs[..first.0].trim().is_empty() || first.1 - first.0 > 2;
        (adjacent && same && has_content).then_some(second.0)
    })
}

/// Step 5: once "=" is present, cut explanatory text after the formula.
pub fn truncate_explanatory_tail(text: &str, origin: TextOrigin) -> String {
    let Some(eq) = text.find('=') else {
        return text.to_string();
    };
    let rhs_start = eq + 1;
    let rhs = &text[rhs_start..];

    let mut cut = first_tail_start(&UNIT_TAIL_REGEX, rhs);
    if origin == TextOrigin::ObjectTree {
        let candidates = [
            first_tail_start(&CLAUSE_TAIL_REGEX, rhs),
            duplicate_group_start(rhs),
        ];
        for candidate in candidates.into_iter().flatten() {
            cut = Some(cut.map_or(candidate, |c: usize| c.min(candidate)));
        }
    }

    let kept = match cut {
        Some(offset) => &text[..rhs_start + offset],
        None => text,
    };
    let kept = EQUATION_NUMBER_REGEX.replace(kept, "");
    kept.trim_end()
        .trim_end_matches([',', ';', ':'])
        .trim_end()
        .to_string()
}

/// Step 6: no spaces around operators, single spaces elsewhere.
pub fn normalize_whitespace(text: &str) -> String {
    let tight = OPERATOR_SPACING_REGEX.replace_all(text, "$1");
    WHITESPACE_REGEX.replace_all(&tight, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_math_italic_letters_fold_to_latin() {
        // 𝐸 (bold E), 𝑚 (italic m), 𝑐 (italic c)
        assert_eq!(repair_symbols("𝐄=𝑚𝑐"), "E=mc");
        assert_eq!(repair_symbols("ℎ𝜈"), "h𝜈");
        assert_eq!(repair_symbols("𝟐"), "2");
    }

    #[test]
    fn test_isolated_cyrillic_lookalikes_become_latin() {
        assert_eq!(repair_symbols("Р = А / t"), "P = A / t");
        assert_eq!(repair_symbols("ТС=5"), "TC=5");
        assert_eq!(repair_symbols("АВ = 1"), "AB = 1");
        // runs with a letter outside the table, or longer than a variable pair, stay words
        assert_eq!(repair_symbols("при Т"), "при T");
        assert_eq!(repair_symbols("СССР"), "СССР");
        // words keep their letters
        assert_eq!(repair_symbols("где"), "где");
    }

    #[test]
    fn test_unit_abbreviations_become_latin() {
        assert_eq!(repair_symbols("R = 5 кОм"), "R = 5 kOhm");
        assert_eq!(repair_symbols("m = 2 кг"), "m = 2 kg");
    }

    #[test]
    fn test_operator_variants_collapse() {
        assert_eq!(repair_operators("a − b × c ÷ d"), "a - b * c / d");
        assert_eq!(repair_operators("x == y"), "x = y");
        assert_eq!(repair_operators("E=mc²"), "E=mc^2");
    }

    #[test]
    fn test_duplicated_superscript_collapses() {
        assert_eq!(repair_duplicated_superscripts("E=mc2c^2"), "E=mc^2");
        assert_eq!(repair_duplicated_superscripts("x2x^3"), "x2x^3");
        assert_eq!(repair_duplicated_superscripts("a2b^2"), "a2b^2");
    }

    #[test]
    fn test_misplaced_exponent_moves_to_trailing_token() {
        assert_eq!(repair_misplaced_exponent("2E=mc"), "E=mc^2");
        assert_eq!(repair_misplaced_exponent("2 E = mc "), "E= mc^2");
        // ordinary coefficient stays
        assert_eq!(repair_misplaced_exponent("2x=6"), "2x=6");
        assert_eq!(repair_misplaced_exponent("2E=5"), "2E=5");
    }

    #[test]
    fn test_merged_ratio_pairs_get_division() {
        assert_eq!(repair_merged_ratios("UI=5"), "U/I=5");
        assert_eq!(repair_merged_ratios("R=UI"), "R=U/I");
        assert_eq!(repair_merged_ratios("p=FS+1"), "p=F/S+1");
        assert_eq!(repair_merged_ratios("XY = 3"), "X/Y = 3");
        // not standalone, not a known pair
        assert_eq!(repair_merged_ratios("ABC=1"), "ABC=1");
        assert_eq!(repair_merged_ratios("XY+1=2"), "XY+1=2");
        assert_eq!(repair_merged_ratios("U/I=5"), "U/I=5");
    }

    #[test]
    fn test_unit_tail_is_truncated() {
        assert_eq!(
            truncate_explanatory_tail("R = U/I, Ohm", TextOrigin::Layout),
            "R = U/I"
        );
        assert_eq!(
            truncate_explanatory_tail("v = s/t m/s", TextOrigin::Layout),
            "v = s/t"
        );
        assert_eq!(
            truncate_explanatory_tail("U = IR, V", TextOrigin::Layout),
            "U = IR"
        );
        // nothing before the unit: kept
        assert_eq!(truncate_explanatory_tail("x = kg", TextOrigin::Layout), "x = kg");
        // no relation: kept
        assert_eq!(truncate_explanatory_tail("5 kg", TextOrigin::Layout), "5 kg");
    }

    #[test]
    fn test_clause_tail_only_for_object_tree() {
        let text = "F = ma, где m - масса";
        assert_eq!(truncate_explanatory_tail(text, TextOrigin::ObjectTree), "F = ma");
        assert_eq!(truncate_explanatory_tail(text, TextOrigin::Layout), text);
    }

    #[test]
    fn test_duplicate_group_truncated_for_object_tree() {
        assert_eq!(
            truncate_explanatory_tail("y=(a+b)(a+b)", TextOrigin::ObjectTree),
            "y=(a+b)"
        );
        assert_eq!(
            truncate_explanatory_tail("y=(a+b)(a-b)", TextOrigin::ObjectTree),
            "y=(a+b)(a-b)"
        );
    }

    #[test]
    fn test_equation_number_stripped() {
        assert_eq!(truncate_explanatory_tail("E=mc^2 (1)", TextOrigin::Layout), "E=mc^2");
        assert_eq!(
            truncate_explanatory_tail("E=mc^2 (1.2) (1.2)", TextOrigin::ObjectTree),
            "E=mc^2"
        );
        assert_eq!(truncate_explanatory_tail("f=g(1)", TextOrigin::Layout), "f=g(1)");
    }

    #[test]
    fn test_whitespace_normalized_around_operators() {
        assert_eq!(normalize_whitespace("  a  =  b +   c  d "), "a=b+c d");
    }

    #[test]
    fn test_full_pipeline() {
        assert_eq!(normalize("E=mc2c^2", TextOrigin::ObjectTree), "E=mc^2");
        assert_eq!(normalize("UI=5", TextOrigin::ObjectTree), "U/I=5");
        assert_eq!(normalize("ТС=5", TextOrigin::ObjectTree), "T/C=5");
        assert_eq!(normalize("𝑅 = 𝑈 / 𝐼 , Ом", TextOrigin::Layout), "R=U/I");
        assert_eq!(normalize("2E = mc", TextOrigin::Layout), "E=mc^2");
        assert_eq!(normalize("  plain text  ", TextOrigin::Layout), "plain text");
        assert_eq!(normalize("", TextOrigin::Layout), "");
    }

    #[test]
    fn test_normalize_is_idempotent_on_samples() {
        let samples = [
            "E=mc2c^2",
            "UI=5",
            "AB kg = 1",
            "x = AB kg",
            "F = ma, где m - масса (1)",
            "2E = mc kg",
            "y=(a+b)(a+b)(a+b)",
            "P − U × I == 0",
        ];
        for origin in [TextOrigin::Layout, TextOrigin::ObjectTree] {
            for sample in samples {
                let once = normalize(sample, origin);
                let twice = normalize(&once, origin);
                assert_eq!(once, twice, "sample {sample:?} ({origin:?})");
            }
        }
    }

    #[test]
    fn test_normalized_key_lowercases_and_strips_spaces() {
        assert_eq!(normalized_key("E=mc^2"), "e=mc^2");
        assert_eq!(normalized_key("a b"), "ab");
    }
}
