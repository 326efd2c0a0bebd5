use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// One uploaded meal photo. Lives for the duration of a single analyze call
/// and is never written to disk.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub data: Bytes,
    pub filename: String,
    pub content_type: String,
}

impl UploadedImage {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Canonical nutrition breakdown returned to the frontend.
///
/// Every field is optional: the tolerant passthrough path forwards whatever
/// subset the webhook produced, and absent fields are omitted from the JSON
/// rather than serialized as null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fat: Option<f64>,
    #[serde(rename = "foodItems", skip_serializing_if = "Option::is_none")]
    pub food_items: Option<Vec<FoodItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// A single recognized food on the plate. Quantity is free-form ("1 cup",
/// "150g"). Missing fields decode to empty/zero instead of rejecting the
/// whole record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
}

/// Wire shape for every failed analyze call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serialization_omits_absent_fields() {
        let record = NutritionRecord {
            protein: Some(10.0),
            carbs: Some(20.0),
            fat: Some(5.0),
            calories: Some(185.0),
            ..Default::default()
        };

        let json = serde_json::to_value(&record).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj.len(), 4);
        assert!(!obj.contains_key("foodItems"));
        assert!(!obj.contains_key("summary"));
        assert_eq!(obj["calories"], 185.0);
    }

    #[test]
    fn test_food_items_field_name() {
        let record = NutritionRecord {
            food_items: Some(vec![FoodItem {
                name: "Chicken".to_string(),
                quantity: "150g".to_string(),
                calories: 300.0,
                protein: 25.0,
                carbs: 0.0,
                fat: 15.0,
            }]),
            ..Default::default()
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["foodItems"][0]["name"], "Chicken");
    }

    #[test]
    fn test_food_item_tolerates_missing_fields() {
        let item: FoodItem = serde_json::from_str(r#"{"name": "Rice"}"#).unwrap();

        assert_eq!(item.name, "Rice");
        assert_eq!(item.quantity, "");
        assert_eq!(item.calories, 0.0);
    }

    #[test]
    fn test_error_body_serialization() {
        let body = ErrorBody {
            error: "No image provided".to_string(),
            details: None,
        };

        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"error":"No image provided"}"#);
    }
}
