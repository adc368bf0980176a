use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparable unit of cleaned formula text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Token {
    /// Case-folded alphabetic run
    Word(String),
    /// Numeric literal, optionally with a "^n" exponent suffix
    Number(String),
    /// Canonical operator character
    Operator(char),
}

impl Token {
    pub fn is_operator(&self) -> bool {
        matches!(self, Token::Operator(_))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(w) => write!(f, "{w}"),
            Token::Number(n) => write!(f, "{n}"),
            Token::Operator(op) => write!(f, "{op}"),
        }
    }
}

/// One representative per class of visually equivalent operator glyphs.
pub fn canonical_operator(c: char) -> Option<char> {
    let canonical = match c {
        '=' | '＝' => '=',
        '+' => '+',
        '-' | '−' | '–' | '‐' | '‑' => '-',
        '*' | '·' | '⋅' | '∙' | '×' | '∗' => '*',
        '/' | '÷' | '∕' => '/',
        '^' => '^',
        '<' => '<',
        '>' => '>',
        '≤' | '≦' => '≤',
        '≥' | '≧' => '≥',
        '≠' => '≠',
        '≈' | '≅' => '≈',
        '(' | '[' | '{' => '(',
        ')' | ']' | '}' => ')',
        '∑' => '∑',
        '∫' => '∫',
        '∂' => '∂',
        '√' => '√',
        '±' => '±',
        _ => return None,
    };
    Some(canonical)
}

/// Split cleaned text into words, numbers and canonical operators. Anything else
/// (whitespace, punctuation outside the operator set) separates tokens and is dropped.
pub fn tokenize(cleaned: &str) -> Vec<Token> {
    let chars: Vec<char> = cleaned.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_alphabetic() {
            let start = i;
            while i < chars.len() && chars[i].is_alphabetic() {
                i += 1;
            }
            let word: String = chars[start..i].iter().flat_map(|c| c.to_lowercase()).collect();
            tokens.push(Token::Word(word));
        } else if c.is_ascii_digit() {
            let start = i;
            i = skip_digits(&chars, i);
            // decimal part: "3.14" or "3,14"
            if i + 1 < chars.len()
                && (chars[i] == '.' || chars[i] == ',')
                && chars[i + 1].is_ascii_digit()
            {
                i = skip_digits(&chars, i + 1);
            }
            // exponent suffix: "10^3"
            if i + 1 < chars.len() && chars[i] == '^' && chars[i + 1].is_ascii_digit() {
                i = skip_digits(&chars, i + 1);
            }
            tokens.push(Token::Number(chars[start..i].iter().collect()));
        } else {
            if let Some(op) = canonical_operator(c) {
                tokens.push(Token::Operator(op));
            }
            i += 1;
        }
    }

    tokens
}

fn skip_digits(chars: &[char], mut i: usize) -> usize {
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(tokens: &[Token]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_tokenize_formula() {
        let tokens = tokenize("E=mc^2");
        assert_eq!(words(&tokens), vec!["e", "=", "mc", "^", "2"]);
        assert_eq!(tokens[1], Token::Operator('='));
        assert_eq!(tokens[4], Token::Number("2".to_string()));
    }

    #[test]
    fn test_numbers_keep_decimal_and_exponent() {
        let tokens = tokenize("x = 3,14 * 10^3");
        assert_eq!(
            tokens,
            vec![
                Token::Word("x".to_string()),
                Token::Operator('='),
                Token::Number("3,14".to_string()),
                Token::Operator('*'),
                Token::Number("10^3".to_string()),
            ]
        );
    }

    #[test]
    fn test_operator_variants_share_a_token() {
        assert_eq!(tokenize("a−b"), tokenize("a-b"));
        assert_eq!(tokenize("a×b"), tokenize("a·b"));
        assert_eq!(tokenize("a÷b"), tokenize("a/b"));
        assert_eq!(tokenize("[x]"), tokenize("(x)"));
    }

    #[test]
    fn test_unknown_punctuation_dropped() {
        assert_eq!(words(&tokenize("a, b; c!")), vec!["a", "b", "c"]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_greek_letters_are_words() {
        assert_eq!(words(&tokenize("Δφ=ωt")), vec!["δφ", "=", "ωt"]);
    }
}
