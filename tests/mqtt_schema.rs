// Schema validation tests for MQTT wire format
//
// These tests construct JSON values directly (independent of Rust structs)
// and validate them against the JSON Schema files in schemas/mqtt/.

use serde_json::json;

fn load_schema(name: &str) -> serde_json::Value {
    let path = format!(
        "{}/schemas/mqtt/{name}",
        env!("CARGO_MANIFEST_DIR")
    );
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read schema {path}: {e}"));
    serde_json::from_str(&text)
        .unwrap_or_else(|e| panic!("Failed to parse schema {path}: {e}"))
}

fn build_validator(schema_name: &str) -> jsonschema::Validator {
    let schema = load_schema(schema_name);
    jsonschema::options()
        .with_retriever(LocalRetriever)
        .build(&schema)
        .unwrap_or_else(|e| panic!("Failed to compile schema {schema_name}: {e}"))
}

fn validate(schema_name: &str, instance: &serde_json::Value) {
    let validator = build_validator(schema_name);
    let errors: Vec<_> = validator.iter_errors(instance).collect();
    if !errors.is_empty() {
        let msgs: Vec<String> = errors.iter().map(|e| format!("  - {e}")).collect();
        panic!(
            "Schema validation failed for {schema_name}:\n{}\nInstance: {}",
            msgs.join("\n"),
            serde_json::to_string_pretty(instance).unwrap()
        );
    }
}

fn validate_fails(schema_name: &str, instance: &serde_json::Value) {
    let validator = build_validator(schema_name);
    assert!(
        !validator.is_valid(instance),
        "Expected schema validation to fail for {schema_name}, but it passed.\nInstance: {}",
        serde_json::to_string_pretty(instance).unwrap()
    );
}

// Retriever that loads $ref schemas from the local filesystem
struct LocalRetriever;

impl jsonschema::Retrieve for LocalRetriever {
    fn retrieve(
        &self,
        uri: &jsonschema::Uri<String>,
    ) -> Result<serde_json::Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        let schema_dir = format!("{}/schemas/mqtt/", env!("CARGO_MANIFEST_DIR"));

        // Extract the schema filename from various URI forms:
        // - "json-schema:///device_status.schema.json"
        // - "file:///path/to/device_status.schema.json"
        // - "device_status.schema.json"
        let filename = if let Some(rest) = uri_str.strip_prefix("json-schema:///") {
            rest
        } else if let Some(path) = uri_str.strip_prefix("file://") {
            // For file:// URIs, use the path directly
            let text = std::fs::read_to_string(path)?;
            return Ok(serde_json::from_str(&text)?);
        } else {
            uri_str
        };

        let path = format!("{schema_dir}{filename}");
        if std::path::Path::new(&path).exists() {
            let text = std::fs::read_to_string(&path)?;
            return Ok(serde_json::from_str(&text)?);
        }
        Err(format!("Cannot retrieve schema: {uri_str}").into())
    }
}

// =========================================================================
// Control
// =========================================================================

#[test]
fn control_arm_away() {
    validate(
        "control.schema.json",
        &json!({ "action": "ARM_AWAY", "code": "1234" }),
    );
}

#[test]
fn control_all_actions() {
    for action in ["ARM_HOME", "ARM_AWAY", "DISARM", "TRIGGER"] {
        validate(
            "control.schema.json",
            &json!({ "action": action, "code": "0654" }),
        );
    }
}

#[test]
fn control_unknown_action() {
    validate_fails(
        "control.schema.json",
        &json!({ "action": "ARM_NIGHT", "code": "1234" }),
    );
}

#[test]
fn control_missing_code() {
    validate_fails("control.schema.json", &json!({ "action": "DISARM" }));
}

#[test]
fn control_non_numeric_code() {
    validate_fails(
        "control.schema.json",
        &json!({ "action": "DISARM", "code": "12ab" }),
    );
}

// =========================================================================
// Alarm and door state
// =========================================================================

#[test]
fn alarm_state_values() {
    for state in ["disarmed", "arming", "armed_home", "pending", "triggered"] {
        validate("alarm_state.schema.json", &json!(state));
    }
}

#[test]
fn alarm_state_rejects_armed_away() {
    validate_fails("alarm_state.schema.json", &json!("armed_away"));
}

#[test]
fn door_state_values() {
    validate("door_state.schema.json", &json!("payload_on"));
    validate("door_state.schema.json", &json!("payload_off"));
    validate_fails("door_state.schema.json", &json!("open"));
}

// =========================================================================
// Shadow
// =========================================================================

#[test]
fn shadow_reported() {
    validate(
        "shadow_update.schema.json",
        &json!({
            "state": {
                "reported": { "doorIsOpen": false, "alarmState": 2 }
            }
        }),
    );
}

#[test]
fn shadow_accepted_with_metadata() {
    validate(
        "shadow_update.schema.json",
        &json!({
            "state": {
                "desired": { "alarmState": 0 }
            },
            "metadata": {
                "desired": { "alarmState": { "timestamp": 1738900000_u64 } }
            },
            "version": 42,
            "timestamp": 1738900000_u64
        }),
    );
}

#[test]
fn shadow_alarm_state_out_of_range() {
    validate_fails(
        "shadow_update.schema.json",
        &json!({
            "state": {
                "reported": { "doorIsOpen": true, "alarmState": 5 }
            }
        }),
    );
}

#[test]
fn shadow_unknown_status_field() {
    validate_fails(
        "shadow_update.schema.json",
        &json!({
            "state": {
                "reported": { "alarmState": 1, "armed": true }
            }
        }),
    );
}

#[test]
fn shadow_empty_state() {
    validate_fails("shadow_update.schema.json", &json!({ "state": {} }));
}

// =========================================================================
// Library output
// =========================================================================

mod library_output {
    use super::*;
    use keypad_alarm::bridge::homeassistant;
    use keypad_alarm::bridge::shadow::{DeviceStatus, ShadowDocument};
    use keypad_alarm::AlarmState;

    const ALL_STATES: [AlarmState; 5] = [
        AlarmState::Disarmed,
        AlarmState::Arming,
        AlarmState::Armed,
        AlarmState::Triggering,
        AlarmState::Triggered,
    ];

    #[test]
    fn alarm_payloads_match_schema() {
        for state in ALL_STATES {
            validate(
                "alarm_state.schema.json",
                &json!(homeassistant::alarm_payload(state)),
            );
        }
    }

    #[test]
    fn door_payloads_match_schema() {
        for open in [true, false] {
            validate(
                "door_state.schema.json",
                &json!(homeassistant::door_payload(open)),
            );
        }
    }

    #[test]
    fn reported_documents_match_schema() {
        for state in ALL_STATES {
            let doc = ShadowDocument::reported(DeviceStatus {
                door_is_open: state == AlarmState::Triggering,
                alarm_state: state,
            });
            let value: serde_json::Value =
                serde_json::from_str(&doc.to_json().unwrap()).unwrap();
            validate("shadow_update.schema.json", &value);
        }
    }
}
