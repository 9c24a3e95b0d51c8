//! Prompt templates for provider dispatch and the judge call.

use crate::dispatch::AggregatedAnswerSet;
use crate::providers::ProviderId;
use indoc::formatdoc;

/// What a failed provider contributes to the judge prompt. Internal error
/// detail never reaches the judge.
pub const NO_RESPONSE_PLACEHOLDER: &str = "No response";

/// Wrap a user question in the enrichment template every provider receives.
pub fn deep_question_prompt(question: &str) -> String {
    formatdoc! {r#"
        Before answering this question: "{question}", think about the three most important questions that you need to understand to understand the deepness of the initial question.

        Then, provide a 300-word answer in the most concise way.

        Your response should be structured as follows:
        1. First, list the three key questions you identified
        2. Then, provide your concise 300-word answer

        Remember to be precise and focused in your response."#
    }
}

/// System preamble for the judge call. Repeats the section contract so the
/// reply stays parseable.
pub fn judge_system_prompt() -> &'static str {
    "You are an expert at analyzing LLM responses. Always format your response \
     with SUMMARY:, BEST_MODEL:, and EXPLANATION: sections."
}

/// Build the composite judge prompt embedding every provider's answer.
///
/// Providers appear in registry order regardless of dispatch order; failed
/// or absent providers contribute the placeholder string.
pub fn judge_prompt(question: &str, answers: &AggregatedAnswerSet) -> String {
    let mut sections = String::new();
    for (index, provider) in ProviderId::ALL.iter().enumerate() {
        let answer = answers
            .get(provider)
            .and_then(|result| result.answer())
            .unwrap_or(NO_RESPONSE_PLACEHOLDER);
        sections.push_str(&format!(
            "{number}. {name}:\n{answer}\n\n",
            number = index + 1,
            name = display_name(*provider),
        ));
    }

    formatdoc! {r#"
        You are an expert at analyzing LLM responses. Please analyze these responses to the question: "{question}"

        Responses from different models:

        {sections}Please analyze these responses and provide:
        1. A comprehensive summary that combines the best aspects of all responses
        2. Identify which model provided the most accurate and helpful response (must be one of: openai, gemini, grok, deepseek)
        3. Explain why that model's response was the best

        Format your response exactly like this:
        SUMMARY: [your comprehensive summary here]
        BEST_MODEL: [model name]
        EXPLANATION: [your explanation here]"#
    }
}

fn display_name(provider: ProviderId) -> &'static str {
    match provider {
        ProviderId::OpenAi => "OpenAI",
        ProviderId::Gemini => "Gemini",
        ProviderId::Grok => "Grok",
        ProviderId::Deepseek => "Deepseek",
    }
}
