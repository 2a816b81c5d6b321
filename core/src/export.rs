//! Export of a successful prediction as a downloadable JSON document.

use crate::error::CoreError;
use crate::session::Phase;
use crate::types::PredictionResponse;

pub const EXPORT_FILE_NAME: &str = "prediction_result.json";

/// Pretty-printed JSON with the service's field names.
pub fn to_document(response: &PredictionResponse) -> Result<String, CoreError> {
    Ok(serde_json::to_string_pretty(response)?)
}

/// Export the result held by `phase`, if there is one.
pub fn export_phase(phase: &Phase) -> Result<String, CoreError> {
    match phase {
        Phase::Success(response) => to_document(response),
        _ => Err(CoreError::NothingToExport),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_matches_wire_format() {
        let response = PredictionResponse {
            action: "basketball".to_string(),
            confidence: 92.3,
            processing_time: 1.8,
        };
        let doc = to_document(&response).unwrap();
        assert_eq!(
            doc,
            concat!(
                "{\n",
                "  \"action\": \"basketball\",\n",
                "  \"confidence\": 92.3,\n",
                "  \"processing_time\": 1.8\n",
                "}"
            )
        );

        let parsed: PredictionResponse = serde_json::from_str(&doc).unwrap();
        assert_eq!(parsed, response);
    }

    #[test]
    fn test_export_requires_success() {
        assert!(matches!(
            export_phase(&Phase::Loading),
            Err(CoreError::NothingToExport)
        ));
        assert!(matches!(
            export_phase(&Phase::Idle),
            Err(CoreError::NothingToExport)
        ));
    }
}
