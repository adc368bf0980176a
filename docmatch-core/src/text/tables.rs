//! Fixed substitution tables and pattern lists used by the normalizer.
//!
//! Kept as plain data so each table can be checked on its own.

use std::ops::RangeInclusive;

/// Mathematical Alphanumeric Symbols, Latin letters: 13 styles of 52 letters (A-Z, a-z).
pub const MATH_ALPHANUMERIC_LATIN: RangeInclusive<u32> = 0x1D400..=0x1D6A3;

/// Mathematical Alphanumeric Symbols, digits: 5 styles of 10 digits.
pub const MATH_ALPHANUMERIC_DIGITS: RangeInclusive<u32> = 0x1D7CE..=0x1D7FF;

/// Letterlike symbols that fill the holes of the math alphanumeric block.
pub const LETTERLIKE_SYMBOLS: &[(char, char)] = &[
    ('ℎ', 'h'),
    ('ℓ', 'l'),
    ('ℯ', 'e'),
    ('ℊ', 'g'),
    ('ℴ', 'o'),
    ('ℬ', 'B'),
    ('ℰ', 'E'),
    ('ℱ', 'F'),
    ('ℋ', 'H'),
    ('ℐ', 'I'),
    ('ℒ', 'L'),
    ('ℳ', 'M'),
    ('ℛ', 'R'),
    ('ℂ', 'C'),
    ('ℕ', 'N'),
    ('ℙ', 'P'),
    ('ℚ', 'Q'),
    ('ℝ', 'R'),
    ('ℤ', 'Z'),
    ('ℭ', 'C'),
    ('ℌ', 'H'),
    ('ℑ', 'I'),
    ('ℜ', 'R'),
    ('ℨ', 'Z'),
];

/// Cyrillic letters drawn identically to Latin ones. Only applied to isolated letters,
/// so Cyrillic words survive for the clause truncation step.
pub const CYRILLIC_LOOKALIKES: &[(char, char)] = &[
    ('А', 'A'),
    ('В', 'B'),
    ('Е', 'E'),
    ('К', 'K'),
    ('М', 'M'),
    ('Н', 'H'),
    ('О', 'O'),
    ('Р', 'P'),
    ('С', 'C'),
    ('Т', 'T'),
    ('У', 'Y'),
    ('Х', 'X'),
    ('а', 'a'),
    ('е', 'e'),
    ('о', 'o'),
    ('р', 'p'),
    ('с', 'c'),
    ('у', 'y'),
    ('х', 'x'),
];

/// Cyrillic unit abbreviations and their Latin spelling, longest first.
pub const UNIT_ABBREVIATIONS: &[(&str, &str)] = &[
    ("кОм", "kOhm"),
    ("кВт", "kW"),
    ("кГц", "kHz"),
    ("МГц", "MHz"),
    ("кПа", "kPa"),
    ("м/с", "m/s"),
    ("км/ч", "km/h"),
    ("Ом", "Ohm"),
    ("кг", "kg"),
    ("Вт", "W"),
    ("Гц", "Hz"),
    ("Дж", "J"),
    ("Па", "Pa"),
    ("мА", "mA"),
    ("мВ", "mV"),
    ("кВ", "kV"),
    ("моль", "mol"),
    ("рад", "rad"),
];

/// Operator glyph variants and their canonical ASCII spelling.
pub const OPERATOR_SUBSTITUTIONS: &[(char, &str)] = &[
    ('−', "-"),
    ('–', "-"),
    ('‐', "-"),
    ('‑', "-"),
    ('·', "*"),
    ('⋅', "*"),
    ('∙', "*"),
    ('×', "*"),
    ('∗', "*"),
    ('÷', "/"),
    ('∕', "/"),
    ('＝', "="),
    ('⁰', "^0"),
    ('¹', "^1"),
    ('²', "^2"),
    ('³', "^3"),
    ('⁴', "^4"),
    ('⁵', "^5"),
    ('⁶', "^6"),
    ('⁷', "^7"),
    ('⁸', "^8"),
    ('⁹', "^9"),
];

/// Capital pairs that stand for a ratio of two physical quantities (U/I, F/S, ...).
pub const RATIO_PAIRS: &[&str] = &["UI", "UR", "QU", "QT", "FS", "FQ", "PU", "PI", "AT"];

/// Leading digits that are read as a misplaced exponent in front of the left-hand side.
pub const MISPLACED_EXPONENT_DIGITS: &[char] = &['2', '3'];

/// Latin unit tokens that end the formula part of a line once "=" has been seen.
pub const UNIT_TOKENS: &[&str] = &[
    "kOhm", "Ohm", "kg", "kW", "kV", "kHz", "MHz", "kPa", "mA", "mV", "Hz", "Pa", "km/h",
    "m/s", "mol", "rad", "°C",
];

/// Single-letter units, only recognised after a comma ("U = IR, V").
pub const COMMA_UNIT_LETTERS: &[char] = &['V', 'A', 'W', 'J', 'N', 'B'];

/// Words that open an explanatory clause in object-tree text ("..., where ...").
pub const CLAUSE_WORDS: &[&str] = &[
    "где", "здесь", "при", "если", "причём", "where", "here", "with", "if",
];

/// Glyphs a fragment must not end with for a following space to be inserted.
pub const BINDING_END_GLYPHS: &[char] = &['=', '+', '-', '×', '÷', '/', '^', '(', '['];

/// Glyphs a fragment must not start with for a preceding space to be inserted.
pub const BINDING_START_GLYPHS: &[char] = &['=', '+', '-', '×', '÷', '/', '^', ')', ']', '²', '³'];

pub fn lookup_char(table: &[(char, char)], c: char) -> Option<char> {
    table.iter().find(|(from, _)| *from == c).map(|(_, to)| *to)
}

pub fn lookup_str(table: &[(char, &'static str)], c: char) -> Option<&'static str> {
    table.iter().find(|(from, _)| *from == c).map(|(_, to)| *to)
}
