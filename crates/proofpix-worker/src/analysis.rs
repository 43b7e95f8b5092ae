//! Parsing of the analysis model's free-text answer.
//!
//! The model is prompted to answer with a confidence score in `[0.0, 1.0]`
//! and a justification:
//!
//! ```text
//! Confidence Score: 0.98
//!
//! Justification: The lighting and shadows appear natural.
//! ```
//!
//! Labels are matched case-insensitively. The justification runs until the
//! first blank line or the end of the text.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Label preceding the numeric confidence.
pub const SCORE_LABEL: &str = "confidence score";

/// Label preceding the narrative.
pub const JUSTIFICATION_LABEL: &str = "justification";

/// Multiplier from model confidence to originality score.
pub const SCORE_SCALE: f64 = 100.0;

/// Pattern ending the narrative: a blank line, which may hold spaces or
/// tabs. The end of the text also ends it.
pub const NARRATIVE_TERMINATOR: &str = r"\n[ \t]*\n";

/// Score and narrative extracted from an analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAnalysis {
    /// Originality score, 0..=100.
    pub score: u8,
    pub narrative: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("no 'confidence score:' label in analysis")]
    MissingScore,

    #[error("confidence score '{0}' is not a number")]
    InvalidScore(String),

    #[error("confidence score {0} is outside [0.0, 1.0]")]
    ScoreOutOfRange(f64),

    #[error("no 'justification:' label in analysis")]
    MissingJustification,
}

struct Patterns {
    score: Regex,
    justification: Regex,
}

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

/// `label` as a regex fragment; inner whitespace matches
/// any run of whitespace.
fn label_pattern(label: &str) -> String {
    label
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+")
}

fn patterns() -> &'static Patterns {
    PATTERNS.get_or_init(|| {
        // Captures whatever follows the label up to whitespace so that
        // malformed numbers are reported rather than skipped.
        let score = format!(r"(?i){}:\s*([^\s]*)", label_pattern(SCORE_LABEL));
        let justification = format!(
            r"(?is){}:\s*(\S.*?)(?:{}|\z)",
            label_pattern(JUSTIFICATION_LABEL),
            NARRATIVE_TERMINATOR
        );
        Patterns {
            score: Regex::new(&score).expect("score regex must compile"),
            justification: Regex::new(&justification)
                .expect("justification regex must compile"),
        }
    })
}

/// Extract the score and narrative from `text`.
pub fn parse_analysis(text: &str) -> Result<ParsedAnalysis, ParseError> {
    let score = parse_score(text)?;
    let narrative = parse_narrative(text)?;
    Ok(ParsedAnalysis { score, narrative })
}

/// Score and narrative, or score 0 and the raw text when parsing fails.
pub fn parse_or_fallback(text: &str) -> (ParsedAnalysis, Option<ParseError>) {
    match parse_analysis(text) {
        Ok(parsed) => (parsed, None),
        Err(e) => (
            ParsedAnalysis {
                score: 0,
                narrative: text.to_string(),
            },
            Some(e),
        ),
    }
}

fn parse_score(text: &str) -> Result<u8, ParseError> {
    let raw = patterns()
        .score
        .captures(text)
        .and_then(|c| c.get(1))
        .ok_or(ParseError::MissingScore)?
        .as_str()
        // Sentence punctuation directly after the number.
        .trim_end_matches(|c: char| matches!(c, ',' | ';' | ')'))
        .trim_end_matches('.');

    if raw.is_empty() {
        return Err(ParseError::InvalidScore(String::new()));
    }
    let value: f64 = raw
        .parse()
        .map_err(|_| ParseError::InvalidScore(raw.to_string()))?;
    if !value.is_finite() {
        return Err(ParseError::InvalidScore(raw.to_string()));
    }
    if !(0.0..=1.0).contains(&value) {
        return Err(ParseError::ScoreOutOfRange(value));
    }
    // Truncation, computed in f64 so 0.29 becomes 29.
    let scaled = (value * SCORE_SCALE + 1e-9).floor();
    Ok(scaled.clamp(0.0, SCORE_SCALE) as u8)
}

fn parse_narrative(text: &str) -> Result<String, ParseError> {
    let captured = patterns()
        .justification
        .captures(text)
        .and_then(|c| c.get(1))
        .ok_or(ParseError::MissingJustification)?;
    Ok(captured.as_str().trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_answer() {
        println!("=== TEST: canonical analysis ===");
        let text = "Confidence Score: 0.98\n\nJustification: The lighting and shadows appear natural.";
        let parsed = parse_analysis(text).unwrap();
        println!("AFTER: {:?}", parsed);
        assert_eq!(parsed.score, 98);
        assert_eq!(parsed.narrative, "The lighting and shadows appear natural.");
        println!("RESULT: PASS");
    }

    #[test]
    fn test_labels_are_case_insensitive() {
        let parsed =
            parse_analysis("CONFIDENCE SCORE: 1.0\njustification: fine grain noise").unwrap();
        assert_eq!(parsed.score, 100);
        assert_eq!(parsed.narrative, "fine grain noise");
    }

    #[test]
    fn test_score_is_truncated() {
        let cases = [("0.29", 29), ("0.999", 99), ("0", 0), (".5", 50), ("0.07", 7)];
        for (raw, expected) in cases {
            let text = format!("Confidence Score: {}\nJustification: x", raw);
            assert_eq!(parse_analysis(&text).unwrap().score, expected, "input {}", raw);
        }
    }

    #[test]
    fn test_trailing_period_after_score() {
        let parsed = parse_analysis("Confidence Score: 0.85.\nJustification: ok").unwrap();
        assert_eq!(parsed.score, 85);
    }

    #[test]
    fn test_narrative_spans_single_newlines_and_stops_at_blank_line() {
        let text = "Confidence Score: 0.4\n\nJustification: Line one.\nLine two.  \n\nExtra notes.";
        let parsed = parse_analysis(text).unwrap();
        assert_eq!(parsed.narrative, "Line one.\nLine two.");
    }

    #[test]
    fn test_narrative_before_score() {
        let text = "Justification: warped text on sign\n\nConfidence Score: 0.1";
        let parsed = parse_analysis(text).unwrap();
        assert_eq!(parsed.score, 10);
        assert_eq!(parsed.narrative, "warped text on sign");
    }

    #[test]
    fn test_empty_justification_is_missing() {
        assert_eq!(
            parse_analysis("Confidence Score: 0.5\nJustification:   "),
            Err(ParseError::MissingJustification)
        );
    }

    #[test]
    fn test_missing_labels() {
        assert_eq!(
            parse_analysis("Justification: no score here"),
            Err(ParseError::MissingScore)
        );
        assert_eq!(
            parse_analysis("Confidence Score: 0.85\n\nThis is some other text."),
            Err(ParseError::MissingJustification)
        );
        assert_eq!(parse_analysis(""), Err(ParseError::MissingScore));
    }

    #[test]
    fn test_invalid_and_out_of_range_scores() {
        assert!(matches!(
            parse_analysis("Confidence Score: high\nJustification: x"),
            Err(ParseError::InvalidScore(_))
        ));
        assert!(matches!(
            parse_analysis("Confidence Score: 1.5\nJustification: x"),
            Err(ParseError::ScoreOutOfRange(_))
        ));
        assert!(matches!(
            parse_analysis("Confidence Score: -0.2\nJustification: x"),
            Err(ParseError::ScoreOutOfRange(_))
        ));
    }

    #[test]
    fn test_labels_built_from_constants() {
        println!("=== TEST: labels from constants ===");
        let text = format!(
            "{}:  0.33\n{}: soft focus",
            SCORE_LABEL.to_uppercase(),
            JUSTIFICATION_LABEL
        );
        let parsed = parse_analysis(&text).unwrap();
        println!("AFTER: {:?}", parsed);
        assert_eq!(parsed.score, 33);
        assert_eq!(parsed.narrative, "soft focus");

        // Inner whitespace of a label may be any run of whitespace.
        let spread = SCORE_LABEL.replace(' ', " \t ");
        let parsed = parse_analysis(&format!("{}: 0.5\njustification: x", spread)).unwrap();
        assert_eq!(parsed.score, 50);
        println!("RESULT: PASS");
    }

    #[test]
    fn test_whitespace_only_line_ends_narrative() {
        println!("=== TEST: whitespace-only blank line ===");
        let terminator = Regex::new(NARRATIVE_TERMINATOR).unwrap();
        for blank in ["\n\n", "\n \n", "\n\t \n"] {
            assert!(terminator.is_match(blank), "{:?}", blank);
        }
        assert!(!terminator.is_match("\nx\n"));

        let parsed = parse_analysis("Confidence Score: 0.5\nJustification: first\n \nsecond").unwrap();
        println!("AFTER: {:?}", parsed);
        assert_eq!(parsed.narrative, "first");
        println!("RESULT: PASS");
    }

    #[test]
    fn test_fallback_keeps_raw_text() {
        let (parsed, err) = parse_or_fallback("I cannot tell.");
        assert_eq!(parsed.score, 0);
        assert_eq!(parsed.narrative, "I cannot tell.");
        assert_eq!(err, Some(ParseError::MissingScore));
    }
}
