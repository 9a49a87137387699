use serde::Serialize;
use uuid::Uuid;

/// Events published into a user's room and forwarded to every connection
/// subscribed there. Serialized as `{"event": ..., "data": {...}}` text
/// frames.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum RoomEvent {
    #[serde(rename_all = "camelCase")]
    PredictionComplete {
        image_id: Uuid,
        prediction_id: Uuid,
        predictions: serde_json::Value,
        processed_image: Option<serde_json::Value>,
    },
    ProcessingError { msg: String, error: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prediction_complete_wire_format() {
        let image_id = Uuid::new_v4();
        let prediction_id = Uuid::new_v4();
        let evt = RoomEvent::PredictionComplete {
            image_id,
            prediction_id,
            predictions: json!([{"label": "dog", "score": 0.8}]),
            processed_image: Some(json!("b64")),
        };
        let v: serde_json::Value = serde_json::to_value(&evt).unwrap();
        assert_eq!(v["event"], "predictionComplete");
        assert_eq!(v["data"]["imageId"], json!(image_id));
        assert_eq!(v["data"]["predictionId"], json!(prediction_id));
        assert_eq!(v["data"]["predictions"][0]["label"], "dog");
        assert_eq!(v["data"]["processedImage"], "b64");
    }

    #[test]
    fn processing_error_wire_format() {
        let evt = RoomEvent::ProcessingError {
            msg: "Error processing image".into(),
            error: "connection refused".into(),
        };
        let v: serde_json::Value = serde_json::to_value(&evt).unwrap();
        assert_eq!(v["event"], "processingError");
        assert_eq!(v["data"]["msg"], "Error processing image");
        assert_eq!(v["data"]["error"], "connection refused");
    }
}
