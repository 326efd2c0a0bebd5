//! Webhook reply normalization.
//!
//! The analysis webhook has been observed replying in two incompatible
//! shapes, and which one a deployment gets is not documented anywhere:
//!
//! - envelope: `[{"output": {"status": "success", "total": {...}, "food": [...]}}]`
//! - passthrough: `{"protein": ..., ...}`, possibly wrapped one level deeper
//!   under a `body` field (also when array-enveloped).
//!
//! Normalization order, applied here and nowhere else:
//!
//! 1. The body must parse as JSON. A non-JSON or empty body is rejected as
//!    malformed rather than wrapped and passed through.
//! 2. In `auto` mode (the default), an array whose first element carries an
//!    `output` object is interpreted strictly as the envelope shape. A
//!    non-"success" status is an upstream-declared failure and never falls
//!    back; an envelope missing its totals or food list falls back to the
//!    tolerant passthrough.
//! 3. Passthrough picks the first array element's `body` (else the element),
//!    or an object's `body` (else the object), and decodes it with every
//!    field optional and no value validation.
//!
//! `WEBHOOK_REPLY_SHAPE` pins the order to one shape for deployments whose
//! webhook contract is known.

use serde::Deserialize;
use serde_json::Value;

use crate::error::RelayError;
use crate::models::{FoodItem, NutritionRecord};

/// Which upstream reply shapes the normalizer accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyShape {
    /// Envelope first, tolerant passthrough fallback.
    Auto,
    /// Envelope only; anything else is an invalid format.
    Envelope,
    /// Tolerant passthrough only.
    Passthrough,
}

impl ReplyShape {
    pub fn from_string(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Some(ReplyShape::Auto),
            "envelope" | "array" => Some(ReplyShape::Envelope),
            "passthrough" | "object" => Some(ReplyShape::Passthrough),
            _ => None,
        }
    }

    /// Resolve from `WEBHOOK_REPLY_SHAPE`, defaulting to `auto`. An
    /// unrecognized value logs a warning instead of failing the call.
    pub fn from_env() -> Self {
        match std::env::var("WEBHOOK_REPLY_SHAPE") {
            Ok(raw) => ReplyShape::from_string(&raw).unwrap_or_else(|| {
                log::warn!("Unknown WEBHOOK_REPLY_SHAPE {:?}, using auto", raw);
                ReplyShape::Auto
            }),
            Err(_) => ReplyShape::Auto,
        }
    }
}

#[derive(Debug, Deserialize)]
struct EnvelopeOutput {
    status: String,
    total: Option<MacroTotals>,
    food: Option<Vec<FoodItem>>,
    summary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MacroTotals {
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
}

/// Turn a raw webhook reply body into the canonical record.
///
/// Pure function of its inputs; callers decide what to do with the error.
pub fn normalize(body: &str, shape: ReplyShape) -> Result<NutritionRecord, RelayError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(RelayError::MalformedBody {
            raw: String::new(),
        });
    }

    let value: Value = serde_json::from_str(trimmed).map_err(|_| RelayError::MalformedBody {
        raw: trimmed.to_string(),
    })?;

    match shape {
        ReplyShape::Envelope => from_envelope(&value),
        ReplyShape::Passthrough => from_passthrough(&value),
        ReplyShape::Auto => {
            if has_envelope(&value) {
                match from_envelope(&value) {
                    Ok(record) => Ok(record),
                    // The webhook explicitly said the analysis failed; do not
                    // mask that with a passthrough of the failure envelope.
                    Err(err @ RelayError::AnalysisFailed { .. }) => Err(err),
                    Err(_) => from_passthrough(&value),
                }
            } else {
                from_passthrough(&value)
            }
        }
    }
}

fn has_envelope(value: &Value) -> bool {
    value
        .as_array()
        .and_then(|items| items.first())
        .map(|first| first.get("output").is_some())
        .unwrap_or(false)
}

fn from_envelope(value: &Value) -> Result<NutritionRecord, RelayError> {
    let first = value
        .as_array()
        .and_then(|items| items.first())
        .ok_or_else(|| invalid_format("expected a non-empty JSON array"))?;

    let output = first
        .get("output")
        .ok_or_else(|| invalid_format("first array element has no output field"))?;

    let output: EnvelopeOutput = serde_json::from_value(output.clone())
        .map_err(|err| invalid_format(&format!("output field does not decode: {}", err)))?;

    if output.status != "success" {
        return Err(RelayError::AnalysisFailed {
            status: output.status,
        });
    }

    let total = output
        .total
        .ok_or_else(|| invalid_format("success output has no total field"))?;
    let food = output
        .food
        .ok_or_else(|| invalid_format("success output has no food field"))?;

    Ok(NutritionRecord {
        calories: Some(total.calories),
        protein: Some(total.protein),
        carbs: Some(total.carbs),
        fat: Some(total.fat),
        food_items: Some(food),
        summary: output.summary,
    })
}

fn from_passthrough(value: &Value) -> Result<NutritionRecord, RelayError> {
    let selected = match value {
        Value::Array(items) => {
            let first = items
                .first()
                .ok_or_else(|| invalid_format("empty JSON array"))?;
            first.get("body").unwrap_or(first)
        }
        Value::Object(map) => map.get("body").unwrap_or(value),
        _ => return Err(invalid_format("reply is not a JSON object or array")),
    };

    serde_json::from_value(selected.clone())
        .map_err(|err| invalid_format(&format!("reply does not decode: {}", err)))
}

fn invalid_format(detail: &str) -> RelayError {
    RelayError::UnrecognizedShape {
        detail: detail.to_string(),
    }
}
