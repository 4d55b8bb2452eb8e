//! Structured output parsing for model responses.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// Rating and follow-up questions for a trading-agent prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptReview {
    #[serde(deserialize_with = "rating_from_number_or_string")]
    pub rating: u8,
    pub justification: String,
    #[serde(default)]
    pub questions: Vec<String>,
}

impl PromptReview {
    pub fn parse(response: &str) -> Result<Self> {
        let json_str = extract_json(response)?;
        let review: PromptReview =
            serde_json::from_str(&json_str).context("Failed to parse JSON as PromptReview")?;
        if !(1..=10).contains(&review.rating) {
            anyhow::bail!("Rating must be between 1 and 10 (got {})", review.rating);
        }
        Ok(review)
    }
}

// Models sometimes quote the rating ("7") or emit it as a float (7.0).
fn rating_from_number_or_string<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = serde_json::Value::deserialize(deserializer)?;
    let rating = match &value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match rating {
        Some(r) if r.fract() == 0.0 && (0.0..=255.0).contains(&r) => Ok(r as u8),
        _ => Err(D::Error::custom(format!("invalid rating: {}", value))),
    }
}

/// Trading code and its EventBridge schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedCode {
    pub code: String,
    pub interval: String,
}

impl GeneratedCode {
    pub fn parse(response: &str) -> Result<Self> {
        let json_str = extract_json(response)?;
        serde_json::from_str(&json_str).context("Failed to parse JSON as GeneratedCode")
    }
}

/// True for `rate(<n> <unit>)` and `cron(<6 fields>)` schedule expressions.
pub fn is_schedule_expression(interval: &str) -> bool {
    let interval = interval.trim();
    if let Some(inner) = interval.strip_prefix("rate(").and_then(|s| s.strip_suffix(')')) {
        let mut parts = inner.split_whitespace();
        let (Some(value), Some(unit), None) = (parts.next(), parts.next(), parts.next()) else {
            return false;
        };
        let Ok(value) = value.parse::<u32>() else {
            return false;
        };
        let units: &[&str] = if value == 1 {
            &["minute", "hour", "day"]
        } else {
            &["minutes", "hours", "days"]
        };
        return value > 0 && units.contains(&unit);
    }
    if let Some(inner) = interval.strip_prefix("cron(").and_then(|s| s.strip_suffix(')')) {
        return inner.split_whitespace().count() == 6;
    }
    false
}

/// Extract JSON from a potentially markdown-wrapped response.
pub fn extract_json(response: &str) -> Result<String> {
    let trimmed = response.trim();

    if trimmed.starts_with('{') {
        return Ok(trimmed.to_string());
    }

    if let Some(start) = trimmed.find("```json") {
        let after_marker = &trimmed[start + 7..];
        if let Some(end) = after_marker.find("```") {
            return Ok(after_marker[..end].trim().to_string());
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after_marker = &trimmed[start + 3..];
        if let Some(end) = after_marker.find("```") {
            let content = &after_marker[..end];
            if let Some(json_start) = content.find('{') {
                return Ok(content[json_start..].trim().to_string());
            }
        }
    }

    if let Some(start) = trimmed.find('{') {
        if let Some(end) = trimmed.rfind('}') {
            if end > start {
                return Ok(trimmed[start..=end].to_string());
            }
        }
    }

    anyhow::bail!("Could not find JSON in response")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_review() {
        let response = "```json\n{\"rating\": \"7\", \"justification\": \"Clear DCA plan.\", \"questions\": [\"How much per buy?\"]}\n```";
        let review = PromptReview::parse(response).unwrap();
        assert_eq!(review.rating, 7);
        assert_eq!(review.questions.len(), 1);
    }

    #[test]
    fn rejects_out_of_range_rating() {
        let response = r#"{"rating": 11, "justification": "x", "questions": []}"#;
        assert!(PromptReview::parse(response).is_err());
        let response = r#"{"rating": "<1-10>", "justification": "x"}"#;
        assert!(PromptReview::parse(response).is_err());
    }

    #[test]
    fn parses_code_with_surrounding_prose() {
        let response = "Here you go:\n{\"code\": \"async function baselineFunction() {}\", \"interval\": \"rate(5 minutes)\"}";
        let code = GeneratedCode::parse(response).unwrap();
        assert_eq!(code.interval, "rate(5 minutes)");
        assert!(code.code.contains("baselineFunction"));
    }

    #[test]
    fn schedule_expressions() {
        assert!(is_schedule_expression("rate(5 minutes)"));
        assert!(is_schedule_expression("rate(1 hour)"));
        assert!(is_schedule_expression("cron(0 12 * * ? *)"));
        assert!(!is_schedule_expression("rate(1 hours)"));
        assert!(!is_schedule_expression("rate(0 minutes)"));
        assert!(!is_schedule_expression("every 5 minutes"));
        assert!(!is_schedule_expression("cron(0 12 * *)"));
    }

    #[test]
    fn missing_json_is_an_error() {
        assert!(extract_json("no structured output here").is_err());
    }
}
