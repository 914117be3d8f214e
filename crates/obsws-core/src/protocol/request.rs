//! Request construction.
//!
//! Every outgoing command is a [`RequestMessage`] wrapped at opcode 6. The
//! builder assigns a fresh UUID v4 `requestId` per call so that the eventual
//! RequestResponse can be correlated back to the caller; callers never supply
//! the id themselves. The builder performs no I/O.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::protocol::codec::{encode_envelope, ProtocolError};
use crate::protocol::messages::{OpCode, RequestMessage};

/// Builds a [`RequestMessage`] with a fresh unique `request_id`.
///
/// `fields` may be empty, producing a request with an empty `requestData`
/// document (still serialized on the wire).
pub fn build_request(request_type: &str, fields: BTreeMap<String, String>) -> RequestMessage {
    RequestMessage {
        request_type: request_type.to_string(),
        request_id: Uuid::new_v4().to_string(),
        request_data: fields,
    }
}

/// Encodes a request into its opcode-6 envelope text frame.
///
/// # Errors
///
/// Returns [`ProtocolError::Json`] if serialization fails.
pub fn encode_request(request: &RequestMessage) -> Result<String, ProtocolError> {
    encode_envelope(OpCode::Request, serde_json::to_value(request)?)
}

// ── Typed request helpers ─────────────────────────────────────────────────────

/// Recording-control commands. All take an empty `requestData`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordRequest {
    StartRecord,
    StopRecord,
    ToggleRecord,
    PauseRecord,
    ResumeRecord,
    ToggleRecordPause,
}

impl RecordRequest {
    /// The wire `requestType` string for this command.
    pub fn request_type(self) -> &'static str {
        match self {
            RecordRequest::StartRecord => "StartRecord",
            RecordRequest::StopRecord => "StopRecord",
            RecordRequest::ToggleRecord => "ToggleRecord",
            RecordRequest::PauseRecord => "PauseRecord",
            RecordRequest::ResumeRecord => "ResumeRecord",
            RecordRequest::ToggleRecordPause => "ToggleRecordPause",
        }
    }
}

/// Builds a `ToggleInputMute` request for the named input.
pub fn toggle_input_mute(input_name: &str) -> RequestMessage {
    let mut fields = BTreeMap::new();
    fields.insert("inputName".to_string(), input_name.to_string());
    build_request("ToggleInputMute", fields)
}

/// Builds a `GetProfileParameter` request.
pub fn get_profile_parameter(parameter_category: &str, parameter_name: &str) -> RequestMessage {
    let mut fields = BTreeMap::new();
    fields.insert("parameterCategory".to_string(), parameter_category.to_string());
    fields.insert("parameterName".to_string(), parameter_name.to_string());
    build_request("GetProfileParameter", fields)
}

/// Builds a `SetProfileParameter` request.
pub fn set_profile_parameter(
    parameter_category: &str,
    parameter_name: &str,
    parameter_value: &str,
) -> RequestMessage {
    let mut fields = BTreeMap::new();
    fields.insert("parameterCategory".to_string(), parameter_category.to_string());
    fields.insert("parameterName".to_string(), parameter_name.to_string());
    fields.insert("parameterValue".to_string(), parameter_value.to_string());
    build_request("SetProfileParameter", fields)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_build_request_assigns_unique_ids_across_identical_inputs() {
        // Arrange / Act: identical type and fields on every call
        let ids: BTreeSet<String> = (0..100)
            .map(|_| build_request("GetVersion", BTreeMap::new()).request_id)
            .collect();

        // Assert: N calls produce N distinct ids
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_request_id_is_a_valid_uuid() {
        let request = build_request("GetVersion", BTreeMap::new());
        assert!(Uuid::parse_str(&request.request_id).is_ok());
    }

    #[test]
    fn test_empty_fields_still_serialize_request_data() {
        let request = build_request("StartRecord", BTreeMap::new());
        let text = encode_request(&request).unwrap();

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["op"], 6);
        assert_eq!(value["d"]["requestType"], "StartRecord");
        assert!(value["d"]["requestData"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_toggle_input_mute_carries_input_name() {
        let request = toggle_input_mute("Mic");
        assert_eq!(request.request_type, "ToggleInputMute");
        assert_eq!(request.request_data.get("inputName").unwrap(), "Mic");
    }

    #[test]
    fn test_get_profile_parameter_fields() {
        let request = get_profile_parameter("SimpleOutput", "FilePath");
        assert_eq!(request.request_type, "GetProfileParameter");
        assert_eq!(
            request.request_data.get("parameterCategory").unwrap(),
            "SimpleOutput"
        );
        assert_eq!(request.request_data.get("parameterName").unwrap(), "FilePath");
    }

    #[test]
    fn test_set_profile_parameter_fields() {
        let request = set_profile_parameter("Output", "FilenameFormatting", "take-%CCYY");
        assert_eq!(request.request_data.len(), 3);
        assert_eq!(
            request.request_data.get("parameterValue").unwrap(),
            "take-%CCYY"
        );
    }

    #[test]
    fn test_record_request_types_match_wire_names() {
        assert_eq!(RecordRequest::StartRecord.request_type(), "StartRecord");
        assert_eq!(RecordRequest::StopRecord.request_type(), "StopRecord");
        assert_eq!(
            RecordRequest::ToggleRecordPause.request_type(),
            "ToggleRecordPause"
        );
    }
}
