//! Trading agent launcher: prompt review and strategy code generation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    agent::{
        history::History,
        llm::ChatMessage,
        output::{is_schedule_expression, GeneratedCode, PromptReview},
        prompts,
    },
    AppState,
};

#[derive(Debug, Clone, Serialize)]
pub struct PromptResponse {
    pub response: PromptReview,
    pub history: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CodeResponse {
    Generated(GeneratedCode),
    Failed { error: String, raw_response: String },
}

/// Rates a trading-agent prompt and lists the questions it leaves open.
pub async fn improve_prompt(state: &AppState, prompt: &str, history: Vec<String>) -> Result<PromptResponse> {
    let history = History::from_lines(history, state.config.max_history_length);
    info!(history_len = history.len(), "Reviewing trading agent prompt");

    let system = prompts::prompt_review_system(&history.format(), state.registry.tokens_text());
    let raw = state
        .llm
        .complete(
            &state.config.model_name,
            &[ChatMessage::system(system), ChatMessage::user(prompt)],
        )
        .await
        .context("Prompt review model call failed")?;

    let review = PromptReview::parse(&raw)?;
    let review_text = serde_json::to_string(&review)?;
    let history = history.append(prompt, &review_text);

    Ok(PromptResponse {
        response: review,
        history: history.into_lines(),
    })
}

/// Generates the JavaScript body of the baseline function plus its schedule.
pub async fn generate_code(state: &AppState, prompt: &str) -> Result<CodeResponse> {
    info!("Generating trading agent code");
    let system = prompts::code_generation_system(state.registry.tokens_text());
    let raw = state
        .llm
        .complete(
            &state.config.model_name,
            &[ChatMessage::system(system), ChatMessage::user(prompt)],
        )
        .await
        .context("Code generation model call failed")?;

    Ok(interpret_code_response(raw))
}

fn interpret_code_response(raw: String) -> CodeResponse {
    match GeneratedCode::parse(&raw) {
        Ok(code) if is_schedule_expression(&code.interval) => CodeResponse::Generated(code),
        Ok(code) => {
            warn!(interval = %code.interval, "Model returned an invalid schedule expression");
            CodeResponse::Failed {
                error: "Invalid schedule expression".to_string(),
                raw_response: raw,
            }
        }
        Err(e) => {
            warn!(error = %e, "Model returned unparseable code output");
            CodeResponse::Failed {
                error: "Failed to parse response as JSON".to_string(),
                raw_response: raw,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_code_output_is_accepted() {
        let raw = "```json\n{\"code\": \"async function baselineFunction() { return 1; }\", \"interval\": \"rate(1 day)\"}\n```";
        match interpret_code_response(raw.to_string()) {
            CodeResponse::Generated(code) => assert_eq!(code.interval, "rate(1 day)"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn prose_output_reports_parse_failure() {
        let raw = "I could not write that strategy.".to_string();
        assert_eq!(
            interpret_code_response(raw.clone()),
            CodeResponse::Failed {
                error: "Failed to parse response as JSON".into(),
                raw_response: raw,
            }
        );
    }

    #[test]
    fn bad_interval_is_rejected() {
        let raw = r#"{"code": "x", "interval": "every hour"}"#.to_string();
        let out = interpret_code_response(raw);
        assert!(matches!(out, CodeResponse::Failed { ref error, .. } if error == "Invalid schedule expression"));
    }
}
