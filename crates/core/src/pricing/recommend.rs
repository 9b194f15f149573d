use crate::domain::hotel::{Hotel, StayRequest};
use crate::domain::pricing::{DemandContext, PriceRange};
use crate::domain::recommendation::{FairnessLabel, PriceRecommendation, RecommendationSource};
use crate::llm::error::{truncate, LlmDiagnosticsError};
use crate::llm::{json, CompletionRequest, LlmClient};
use crate::pricing::error::PricingError;
use serde::Serialize;

const FALLBACK_CONFIDENCE: f64 = 0.6;

/// Everything the recommendation is derived from.
#[derive(Debug, Clone, Copy)]
pub struct RecommendationInput<'a> {
    pub hotel: &'a Hotel,
    pub stay: &'a StayRequest,
    pub base: &'a PriceRange,
    pub adjusted: &'a PriceRange,
    pub demand: &'a DemandContext,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationOutcome {
    pub recommendation: PriceRecommendation,
    pub source: RecommendationSource,
}

#[derive(Debug, Serialize)]
struct PricePayload<'a> {
    hotel: HotelPayload<'a>,
    stay: StayPayload,
    city_prices: &'a PriceRange,
    adjusted_prices: AdjustedPayload,
    demand: DemandPayload<'a>,
    budget: Option<BudgetPayload>,
}

#[derive(Debug, Serialize)]
struct HotelPayload<'a> {
    id: uuid::Uuid,
    name: &'a str,
    city: &'a str,
    rating: Option<f64>,
    review_count: i32,
    price_per_night: f64,
}

#[derive(Debug, Serialize)]
struct StayPayload {
    check_in: chrono::NaiveDate,
    check_out: chrono::NaiveDate,
    nights: i64,
    guests: u32,
}

#[derive(Debug, Serialize)]
struct AdjustedPayload {
    min: f64,
    avg: f64,
    max: f64,
    multiplier: f64,
}

#[derive(Debug, Serialize)]
struct DemandPayload<'a> {
    is_peak_month: bool,
    event_active: bool,
    event_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    demand_score: Option<f64>,
}

#[derive(Debug, Serialize)]
struct BudgetPayload {
    min: Option<f64>,
    max: Option<f64>,
}

pub fn build_payload(input: &RecommendationInput<'_>) -> serde_json::Value {
    let RecommendationInput {
        hotel,
        stay,
        base,
        adjusted,
        demand,
    } = *input;

    let budget = (stay.budget_min.is_some() || stay.budget_max.is_some()).then(|| BudgetPayload {
        min: stay.budget_min,
        max: stay.budget_max,
    });

    let payload = PricePayload {
        hotel: HotelPayload {
            id: hotel.id,
            name: &hotel.name,
            city: &hotel.city,
            rating: hotel.rating,
            review_count: hotel.review_count,
            price_per_night: hotel.price_per_night,
        },
        stay: StayPayload {
            check_in: stay.check_in,
            check_out: stay.check_out,
            nights: stay.nights(),
            guests: stay.guests,
        },
        city_prices: base,
        adjusted_prices: AdjustedPayload {
            min: adjusted.min,
            avg: adjusted.avg,
            max: adjusted.max,
            multiplier: demand.multiplier,
        },
        demand: DemandPayload {
            is_peak_month: demand.is_peak_month,
            event_active: demand.event_active(),
            event_name: demand.event_name(),
            demand_score: demand.demand_score,
        },
        budget,
    };

    // Plain data with string keys; serialization cannot fail.
    serde_json::to_value(&payload).unwrap_or_default()
}

fn system_prompt() -> String {
    [
        "You are a hotel pricing analyst. You recommend a fair nightly price range for a stay.",
        "Return ONLY a single JSON object. Do not include prose outside the object.",
        "Output schema:",
        "{",
        "  \"recommended_min\": 0,",
        "  \"recommended_max\": 0,",
        "  \"fairness_label\": \"cheap\" | \"fair\" | \"expensive\",",
        "  \"confidence_score\": 0.0,",
        "  \"explanation\": \"...\"",
        "}",
        "Rules:",
        "- recommended_min must be <= recommended_max; both are nightly prices in the same currency as the input",
        "- fairness_label compares the recommended price to city_prices.avg:",
        "  cheap if below 0.8x the average, expensive if above 1.3x the average, otherwise fair",
        "- confidence_score must be between 0 and 1",
        "- explanation is 2-3 short sentences for a traveller",
        "- if demand.is_peak_month is true, say the dates fall in peak season",
        "- if demand.event_active is true, name the event and say it raises demand",
        "- say whether the price is above or below the city average",
        "- if a budget is given, mention how the range compares to it",
    ]
    .join("\n")
}

fn user_prompt(input: &RecommendationInput<'_>) -> String {
    format!(
        "Recommend a nightly price range for this stay. The adjusted_prices already include the demand multiplier.\n\nStay JSON:\n{}",
        build_payload(input)
    )
}

pub fn completion_request(input: &RecommendationInput<'_>) -> CompletionRequest {
    CompletionRequest {
        system: system_prompt(),
        user: user_prompt(input),
    }
}

/// Deterministic recommendation: the adjusted range as-is, labelled by its midpoint against the
/// city average.
pub fn fallback_recommendation(input: &RecommendationInput<'_>) -> PriceRecommendation {
    let RecommendationInput {
        hotel,
        base,
        adjusted,
        demand,
        ..
    } = *input;

    let fairness_label = FairnessLabel::classify(adjusted.midpoint(), base.avg);

    let mut parts = Vec::with_capacity(3);
    if demand.is_peak_month {
        parts.push(format!(
            "Your dates fall in {}'s peak season, so prices run higher than usual.",
            hotel.city
        ));
    }
    if let Some(event) = demand.event_name() {
        parts.push(format!("{event} is on during your stay, adding to local demand."));
    }
    if parts.is_empty() {
        parts.push("Your dates are outside peak season with no major local events.".to_string());
    }
    parts.push(match fairness_label {
        FairnessLabel::Cheap => format!(
            "A range of {:.0}-{:.0} per night is below the city average of {:.0}.",
            adjusted.min, adjusted.max, base.avg
        ),
        FairnessLabel::Fair => format!(
            "A range of {:.0}-{:.0} per night is in line with the city average of {:.0}.",
            adjusted.min, adjusted.max, base.avg
        ),
        FairnessLabel::Expensive => format!(
            "A range of {:.0}-{:.0} per night is above the city average of {:.0}.",
            adjusted.min, adjusted.max, base.avg
        ),
    });

    PriceRecommendation {
        recommended_min: adjusted.min,
        recommended_max: adjusted.max,
        fairness_label,
        confidence_score: FALLBACK_CONFIDENCE,
        explanation: parts.join(" "),
    }
}

/// Asks the model once. Rate limits surface as [`PricingError::RateLimited`]; every other
/// failure, including malformed output, degrades to [`fallback_recommendation`].
pub async fn request_recommendation(
    llm: &dyn LlmClient,
    input: &RecommendationInput<'_>,
) -> Result<RecommendationOutcome, PricingError> {
    let provider = llm.provider().as_str();
    let hotel_id = input.hotel.id;

    let text = match llm.complete(completion_request(input)).await {
        Ok(text) => text,
        Err(err) => {
            if let Some(diag) = err.downcast_ref::<LlmDiagnosticsError>() {
                if diag.is_rate_limited() {
                    tracing::warn!(provider, %hotel_id, "AI provider rate limited");
                    return Err(PricingError::RateLimited);
                }
                let upstream = diag.truncated_output().unwrap_or_default();
                tracing::warn!(
                    provider,
                    %hotel_id,
                    stage = diag.stage,
                    status = ?diag.status,
                    upstream = %upstream,
                    error = %err,
                    "AI request failed; using fallback recommendation"
                );
            } else {
                tracing::warn!(
                    provider,
                    %hotel_id,
                    error = %truncate(&format!("{err:#}")),
                    "AI request failed; using fallback recommendation"
                );
            }
            return Ok(fallback(input));
        }
    };

    match json::parse_recommendation(&text) {
        Ok(recommendation) => Ok(RecommendationOutcome {
            recommendation,
            source: RecommendationSource::Ai,
        }),
        Err(err) => {
            tracing::warn!(
                provider,
                %hotel_id,
                error = %truncate(&format!("{err:#}")),
                "AI output invalid; using fallback recommendation"
            );
            Ok(fallback(input))
        }
    }
}

fn fallback(input: &RecommendationInput<'_>) -> RecommendationOutcome {
    RecommendationOutcome {
        recommendation: fallback_recommendation(input),
        source: RecommendationSource::Fallback,
    }
}
