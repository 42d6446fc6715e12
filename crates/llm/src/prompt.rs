//! Prompt and response-schema construction for health analysis.

use serde_json::{json, Value};
use vitasense_core::analysis::{CRITICAL_HEART_RATE_STATUSES, CRITICAL_TEMPERATURE_STATUSES};
use vitasense_core::Reading;

use crate::analysis::AnalysisRequest;

pub const SYSTEM_PROMPT: &str = "You are an AI assistant for a smart wearable thermometer that \
also tracks heart rate. You interpret short windows of simulated vital-sign readings and \
answer only with a JSON object matching the requested schema.";

fn join_values(readings: &[Reading]) -> String {
    readings
        .iter()
        .map(|r| r.value.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn quoted(labels: &[&str]) -> String {
    labels
        .iter()
        .map(|l| format!("'{l}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render the user prompt for one analysis request.
///
/// Callers must ensure both windows are non-empty.
pub fn build_prompt(request: &AnalysisRequest) -> String {
    let current_temp = request.temperature.last().map(|r| r.value).unwrap_or_default();
    let current_hr = request.heart_rate.last().map(|r| r.value).unwrap_or_default();

    format!(
        "Analyze the following recent temperature readings (°F) and heart rate readings (BPM).\n\
         The data is in chronological order, oldest first.\n\
         \n\
         Context is crucial for your analysis.\n\
         - Temperature Scenario: \"{temp_scenario}\"\n\
         - Heart Rate Scenario: \"{hr_scenario}\"\n\
         \n\
         Analyze the correlation between the two metrics. For example, a high heart rate \
         during a 'Fever' scenario is expected, but a high heart rate during a 'Normal' \
         temperature and 'Resting' heart rate scenario might indicate stress or another issue.\n\
         \n\
         - Temperature History (°F): [{temp_history}]\n\
         - Heart Rate History (BPM): [{hr_history}]\n\
         \n\
         The current temperature is {current_temp}°F.\n\
         The current heart rate is {current_hr} BPM.\n\
         \n\
         Provide a separate, concise analysis for both temperature and heart rate.\n\
         Set temperatureAlert to true only for {temp_critical}.\n\
         Set heartRateAlert to true only for {hr_critical}.\n\
         Return the response as a JSON object matching the provided schema.",
        temp_scenario = request.temperature_scenario,
        hr_scenario = request.heart_rate_scenario,
        temp_history = join_values(&request.temperature),
        hr_history = join_values(&request.heart_rate),
        temp_critical = quoted(CRITICAL_TEMPERATURE_STATUSES),
        hr_critical = quoted(CRITICAL_HEART_RATE_STATUSES),
    )
}

fn text(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn flag(description: &str) -> Value {
    json!({ "type": "boolean", "description": description })
}

/// JSON Schema for the ten-field analysis response.
pub fn analysis_schema() -> Value {
    let temp_alert = format!(
        "True if temperature status is critical ({}).",
        quoted(CRITICAL_TEMPERATURE_STATUSES)
    );
    let hr_alert = format!(
        "True if heart rate status is critical ({}).",
        quoted(CRITICAL_HEART_RATE_STATUSES)
    );

    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "temperatureSummary": text("A brief, one-sentence summary for the user about their temperature."),
            "temperatureStatus": text("One of: Normal, Mild Fever, High Fever, Heatstroke Warning, Hypothermia Warning."),
            "temperatureRecommendation": text("A short, actionable recommendation regarding temperature."),
            "temperatureProfessionalNote": text("A concise note for a healthcare professional about the temperature trend."),
            "temperatureAlert": flag(&temp_alert),
            "heartRateSummary": text("A brief, one-sentence summary for the user about their heart rate."),
            "heartRateStatus": text("One of: Normal, Elevated (Tachycardia), Low (Bradycardia)."),
            "heartRateRecommendation": text("A short, actionable recommendation regarding heart rate."),
            "heartRateProfessionalNote": text("A concise note for a healthcare professional about the heart rate trend."),
            "heartRateAlert": flag(&hr_alert),
        },
        "required": [
            "temperatureSummary", "temperatureStatus", "temperatureRecommendation",
            "temperatureProfessionalNote", "temperatureAlert",
            "heartRateSummary", "heartRateStatus", "heartRateRecommendation",
            "heartRateProfessionalNote", "heartRateAlert"
        ],
    })
}

/// Extract JSON from an LLM response, handling markdown code blocks.
pub fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    // Handle ```json ... ``` blocks
    if let Some(start) = trimmed.find("```json") {
        let json_start = start + 7;
        if let Some(end) = trimmed[json_start..].find("```") {
            return trimmed[json_start..json_start + end].trim();
        }
    }

    // Handle ``` ... ``` blocks
    if let Some(start) = trimmed.find("```") {
        let json_start = start + 3;
        let after_tick = &trimmed[json_start..];
        let content_start = after_tick.find('\n').map_or(0, |n| n + 1);
        if let Some(end) = after_tick[content_start..].find("```") {
            return after_tick[content_start..content_start + end].trim();
        }
    }

    if let Some(start) = trimmed.find('{') {
        if let Some(end) = trimmed.rfind('}') {
            if end > start {
                return &trimmed[start..=end];
            }
        }
    }

    trimmed
}
