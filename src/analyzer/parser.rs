//! Judge reply parsing.
//!
//! The judge replies in free text with three labeled sections in fixed
//! order. Parsing lives behind this one function so the wire contract can
//! be swapped (e.g. for a structured-output mode) without touching the
//! dispatcher or the analyzer's callers.

use crate::error::AnalysisError;
use crate::providers::ProviderId;

const SUMMARY_LABEL: &str = "SUMMARY:";
const BEST_MODEL_LABEL: &str = "BEST_MODEL:";
const EXPLANATION_LABEL: &str = "EXPLANATION:";

/// A well-formed judge verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVerdict {
    pub summary: String,
    pub best_provider: ProviderId,
    pub explanation: String,
}

/// Extract the three labeled sections from a judge reply.
///
/// Each section runs from its label to the next label; EXPLANATION runs to
/// end of text. The best-model name is normalized (trim, lowercase) and
/// must belong to the known provider set.
pub fn parse_verdict(reply: &str) -> Result<ParsedVerdict, AnalysisError> {
    let summary_start = reply
        .find(SUMMARY_LABEL)
        .ok_or(AnalysisError::MissingSection("SUMMARY"))?;
    let after_summary = &reply[summary_start + SUMMARY_LABEL.len()..];

    let best_start = after_summary
        .find(BEST_MODEL_LABEL)
        .ok_or(AnalysisError::MissingSection("BEST_MODEL"))?;
    let summary = after_summary[..best_start].trim().to_string();
    let after_best = &after_summary[best_start + BEST_MODEL_LABEL.len()..];

    let explanation_start = after_best
        .find(EXPLANATION_LABEL)
        .ok_or(AnalysisError::MissingSection("EXPLANATION"))?;
    let best_raw = after_best[..explanation_start].trim();
    let explanation = after_best[explanation_start + EXPLANATION_LABEL.len()..]
        .trim()
        .to_string();

    let best_provider = ProviderId::parse(best_raw)
        .ok_or_else(|| AnalysisError::InvalidProviderName(best_raw.to_lowercase()))?;

    Ok(ParsedVerdict {
        summary,
        best_provider,
        explanation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn well_formed_reply_parses_into_a_verdict() {
        let reply = indoc! {"
            SUMMARY: All four models agree the answer is 4.
            BEST_MODEL: gemini
            EXPLANATION: Gemini's answer was the most complete.
        "};

        let verdict = parse_verdict(reply).expect("reply should parse");
        assert_eq!(verdict.summary, "All four models agree the answer is 4.");
        assert_eq!(verdict.best_provider, ProviderId::Gemini);
        assert_eq!(
            verdict.explanation,
            "Gemini's answer was the most complete."
        );
    }

    #[test]
    fn multiline_sections_stay_intact() {
        let reply = indoc! {"
            Some preamble the judge added on its own.
            SUMMARY: First line.
            Second line.
            BEST_MODEL: OpenAI
            EXPLANATION: Because it was
            the clearest.
        "};

        let verdict = parse_verdict(reply).expect("reply should parse");
        assert_eq!(verdict.summary, "First line.\nSecond line.");
        assert_eq!(verdict.best_provider, ProviderId::OpenAi);
        assert_eq!(verdict.explanation, "Because it was\nthe clearest.");
    }

    #[test]
    fn each_missing_section_is_reported_by_name() {
        let error = parse_verdict("BEST_MODEL: openai\nEXPLANATION: x")
            .expect_err("missing SUMMARY must fail");
        assert!(matches!(error, AnalysisError::MissingSection("SUMMARY")));

        let error = parse_verdict("SUMMARY: s\nEXPLANATION: x")
            .expect_err("missing BEST_MODEL must fail");
        assert!(matches!(error, AnalysisError::MissingSection("BEST_MODEL")));

        let error = parse_verdict("SUMMARY: s\nBEST_MODEL: openai")
            .expect_err("missing EXPLANATION must fail");
        assert!(matches!(error, AnalysisError::MissingSection("EXPLANATION")));
    }

    #[test]
    fn out_of_vocabulary_best_model_is_rejected() {
        let reply = "SUMMARY: s\nBEST_MODEL: claude\nEXPLANATION: x";
        let error = parse_verdict(reply).expect_err("unknown model must fail");
        match error {
            AnalysisError::InvalidProviderName(name) => assert_eq!(name, "claude"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn best_model_name_is_normalized_before_validation() {
        let reply = "SUMMARY: s\nBEST_MODEL:   DeepSeek  \nEXPLANATION: x";
        let verdict = parse_verdict(reply).expect("mixed-case name should parse");
        assert_eq!(verdict.best_provider, ProviderId::Deepseek);
    }
}
