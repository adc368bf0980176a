use crate::config::ContentFilterConfig;
use crate::error::{ReconcileError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Outcome of classifying one candidate text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum FilterVerdict {
    Accepted { signals: Vec<String> },
    Excluded { pattern: String },
    InsufficientSignals { found: Vec<String>, required: usize },
}

impl FilterVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, FilterVerdict::Accepted { .. })
    }

    pub fn reason(&self) -> String {
        match self {
            FilterVerdict::Accepted { signals } => format!("signals: {}", signals.join(", ")),
            FilterVerdict::Excluded { pattern } => format!("matches exclusion pattern {pattern}"),
            FilterVerdict::InsufficientSignals { found, required } => format!(
                "{} of {} required math signals ({})",
                found.len(),
                required,
                if found.is_empty() { "none".to_string() } else { found.join(", ") }
            ),
        }
    }
}

/// Strict classifier deciding whether a layout text is a formula at all.
#[derive(Debug)]
pub struct ContentFilter {
    enabled: bool,
    signals: Vec<(String, Regex)>,
    exclusions: Vec<Regex>,
    long_text_threshold: usize,
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| ReconcileError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

impl ContentFilter {
    pub fn new(config: &ContentFilterConfig) -> Result<Self> {
        let signals = config
            .signal_patterns
            .iter()
            .map(|signal| Ok((signal.name.clone(), compile(&signal.pattern)?)))
            .collect::<Result<Vec<_>>>()?;
        let exclusions = config
            .exclusion_patterns
            .iter()
            .map(|pattern| compile(pattern))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            enabled: config.enabled,
            signals,
            exclusions,
            long_text_threshold: config.long_text_threshold,
        })
    }

    /// Exclusions win over signals. Short texts need one distinct signal, long ones two.
    pub fn classify(&self, text: &str) -> FilterVerdict {
        if !self.enabled {
            return FilterVerdict::Accepted { signals: Vec::new() };
        }

        if let Some(pattern) = self.exclusions.iter().find(|re| re.is_match(text)) {
            return FilterVerdict::Excluded {
                pattern: pattern.as_str().to_string(),
            };
        }

        let found: Vec<String> = self
            .signals
            .iter()
            .filter(|(_, re)| re.is_match(text))
            .map(|(name, _)| name.clone())
            .collect();
        let required = if text.chars().count() > self.long_text_threshold { 2 } else { 1 };

        if found.len() >= required {
            FilterVerdict::Accepted { signals: found }
        } else {
            FilterVerdict::InsufficientSignals { found, required }
        }
    }

    pub fn is_formula(&self, text: &str) -> bool {
        self.classify(text).is_accepted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SignalPattern;

    fn filter() -> ContentFilter {
        ContentFilter::new(&ContentFilterConfig::default()).unwrap()
    }

    #[test]
    fn test_short_formulas_accepted() {
        let filter = filter();
        assert!(filter.is_formula("E=mc^2"));
        assert!(filter.is_formula("sin x"));
        assert!(filter.is_formula("α"));
        assert!(filter.is_formula("a+b"));
    }

    #[test]
    fn test_prose_rejected() {
        let filter = filter();
        let verdict = filter.classify("Результаты эксперимента приведены ниже");
        assert_eq!(
            verdict,
            FilterVerdict::InsufficientSignals {
                found: vec![],
                required: 2
            }
        );
        assert!(!filter.is_formula("Введение"));
    }

    #[test]
    fn test_long_text_needs_two_signals() {
        let filter = filter();
        // relation only
        assert!(!filter.is_formula("Коэффициент полезного действия равен = ?"));
        // relation and expression
        assert!(filter.is_formula("Мощность определяется как P = U*I для цепи"));
    }

    #[test]
    fn test_exclusions_beat_signals() {
        let filter = filter();
        assert!(matches!(
            filter.classify("[12] Иванов И.И. Физика = наука, с. 45"),
            FilterVerdict::Excluded { .. }
        ));
        assert!(!filter.is_formula("Рис. 3 Схема x=1"));
        assert!(!filter.is_formula("а) x = 1"));
        assert!(!filter.is_formula("doi: 10.1000/182"));
        assert!(!filter.is_formula("2.1 Расчет x = y"));
    }

    #[test]
    fn test_disabled_filter_accepts_everything() {
        let config = ContentFilterConfig {
            enabled: false,
            ..ContentFilterConfig::default()
        };
        assert!(ContentFilter::new(&config).unwrap().is_formula("Введение"));
    }

    #[test]
    fn test_invalid_pattern_reported() {
        let config = ContentFilterConfig {
            signal_patterns: vec![SignalPattern {
                name: "broken".to_string(),
                pattern: "(".to_string(),
            }],
            ..ContentFilterConfig::default()
        };
        let err = ContentFilter::new(&config).unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidPattern { .. }));
    }
}
