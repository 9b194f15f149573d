use crate::domain::contract::LlmPriceRecommendation;
use crate::domain::recommendation::PriceRecommendation;
use anyhow::Context;

pub fn extract_json(text: &str) -> Option<String> {
    let mut inner = text.trim();
    if inner.starts_with("```") {
        // Remove Markdown fences (```json ... ``` or ``` ... ```).
        if let Some(after_first) = inner.split_once('\n').map(|(_, rest)| rest) {
            inner = after_first;
        }
        if let Some(end) = inner.rfind("```") {
            inner = &inner[..end];
        }
    }
    first_object(inner).map(str::to_string)
}

/// First `{` that opens a complete JSON object; anything after its closing `}` is ignored.
fn first_object(text: &str) -> Option<&str> {
    text.match_indices('{').find_map(|(start, _)| {
        let rest = &text[start..];
        let mut values = serde_json::Deserializer::from_str(rest)
            .into_iter::<serde_json::Map<String, serde_json::Value>>();
        match values.next() {
            Some(Ok(_)) => Some(&rest[..values.byte_offset()]),
            _ => None,
        }
    })
}

/// Parses the completion as JSON, retrying on the extracted `{...}` block when the model wrapped
/// it in prose or a code fence. Validation failures are errors either way.
pub fn parse_recommendation(text: &str) -> anyhow::Result<PriceRecommendation> {
    let parsed = match serde_json::from_str::<LlmPriceRecommendation>(text.trim()) {
        Ok(parsed) => parsed,
        Err(direct_err) => {
            let json_str = extract_json(text)
                .with_context(|| format!("no JSON object in LLM output ({direct_err})"))?;
            serde_json::from_str::<LlmPriceRecommendation>(&json_str).with_context(|| {
                format!("LLM output is not valid JSON for recommendation schema: {json_str}")
            })?
        }
    };
    parsed.validate_and_into_recommendation()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recommendation::FairnessLabel;
    use serde_json::json;

    fn valid_json() -> serde_json::Value {
        json!({
            "recommended_min": 5200.5,
            "recommended_max": 6400,
            "fairness_label": "fair",
            "confidence_score": 0.82,
            "explanation": "Peak season in Jaipur; prices slightly above the city average."
        })
    }

    #[test]
    fn extract_json_handles_fenced_blocks() {
        let body = "{\"a\":1}";
        let fenced = format!("```json\n{body}\n```\n");
        assert_eq!(extract_json(&fenced), Some(body.to_string()));
    }

    #[test]
    fn extract_json_falls_back_to_braces() {
        let s = "prefix {\"a\":1} suffix";
        assert_eq!(extract_json(s), Some("{\"a\":1}".to_string()));
    }

    #[test]
    fn extract_json_stops_at_the_first_complete_object() {
        let s = "prices in {INR}: {\"a\":{\"b\":\"}\"}} and {\"c\":2}";
        assert_eq!(extract_json(s), Some("{\"a\":{\"b\":\"}\"}}".to_string()));
        assert_eq!(extract_json("no object {here"), None);
    }

    #[test]
    fn ignores_trailing_prose_with_braces() {
        let text = format!(
            "Here is my answer:\n{}\nPrices are per night in {{INR}}.",
            valid_json()
        );
        let rec = parse_recommendation(&text).unwrap();
        assert_eq!(rec.recommended_min, 5200.5);
    }

    #[test]
    fn uses_the_first_of_two_objects() {
        let text = format!("{}\n\nAlternative: {{\"recommended_min\": 1}}", valid_json());
        let rec = parse_recommendation(&text).unwrap();
        assert_eq!(rec.recommended_max, 6400.0);
        assert_eq!(rec.fairness_label, FairnessLabel::Fair);
    }

    #[test]
    fn parses_direct_json_without_changing_fields() {
        let rec = parse_recommendation(&valid_json().to_string()).unwrap();
        assert_eq!(rec.recommended_min, 5200.5);
        assert_eq!(rec.recommended_max, 6400.0);
        assert_eq!(rec.fairness_label, FairnessLabel::Fair);
        assert_eq!(rec.confidence_score, 0.82);
        assert_eq!(
            rec.explanation,
            "Peak season in Jaipur; prices slightly above the city average."
        );
    }

    #[test]
    fn parses_json_wrapped_in_prose_and_markdown() {
        let text = format!(
            "Sure! Here is the recommendation:\n```json\n{}\n```\nLet me know if you need more.",
            valid_json()
        );
        let rec = parse_recommendation(&text).unwrap();
        assert_eq!(rec.recommended_max, 6400.0);

        let fenced = format!("```json\n{}\n```", valid_json());
        assert!(parse_recommendation(&fenced).is_ok());
    }

    #[test]
    fn rejects_unknown_label() {
        let mut v = valid_json();
        v["fairness_label"] = json!("bargain");
        assert!(parse_recommendation(&v.to_string()).is_err());
    }

    #[test]
    fn rejects_inverted_range() {
        let mut v = valid_json();
        v["recommended_min"] = json!(7000);
        assert!(parse_recommendation(&v.to_string()).is_err());
    }

    #[test]
    fn rejects_confidence_out_of_range() {
        let mut v = valid_json();
        v["confidence_score"] = json!(1.2);
        assert!(parse_recommendation(&v.to_string()).is_err());
    }

    #[test]
    fn rejects_negative_price_and_blank_explanation() {
        let mut v = valid_json();
        v["recommended_min"] = json!(-10);
        assert!(parse_recommendation(&v.to_string()).is_err());

        let mut v = valid_json();
        v["explanation"] = json!("   ");
        assert!(parse_recommendation(&v.to_string()).is_err());
    }

    #[test]
    fn rejects_missing_fields_and_plain_prose() {
        let mut v = valid_json();
        v.as_object_mut().unwrap().remove("explanation");
        assert!(parse_recommendation(&v.to_string()).is_err());
        assert!(parse_recommendation("I cannot help with that.").is_err());
    }
}
