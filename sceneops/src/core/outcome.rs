//! Reduce a raw skill response to a single success verdict.
//!
//! The editor answers in several shapes (`{"success": true}`,
//! `{"status": "success"}`, or either of those wrapped in `{"result": {...}}`).
//! Nothing downstream inspects response internals; every component goes
//! through [`normalize`].

use serde_json::Value;

const SUCCESS_FIELD: &str = "success";
const STATUS_FIELD: &str = "status";
const STATUS_SUCCESS: &str = "success";
const RESULT_FIELD: &str = "result";

/// Return `true` only when a recognized success marker is present.
///
/// Checked locations, in order:
/// - top-level `success == true` or `status == "success"`
/// - the same two markers inside a top-level `result` object (one level deep)
///
/// Every other shape, including `{}`, non-object values, explicit failure
/// markers and truthy-but-not-boolean values such as `"success": "yes"`,
/// yields `false`.
pub fn normalize(response: &Value) -> bool {
    if carries_success_marker(response) {
        return true;
    }
    match response.get(RESULT_FIELD) {
        Some(nested @ Value::Object(_)) => carries_success_marker(nested),
        _ => false,
    }
}

fn carries_success_marker(value: &Value) -> bool {
    let Some(map) = value.as_object() else {
        return false;
    };
    if map.get(SUCCESS_FIELD).and_then(Value::as_bool) == Some(true) {
        return true;
    }
    map.get(STATUS_FIELD).and_then(Value::as_str) == Some(STATUS_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recognizes_all_documented_success_shapes() {
        for response in [
            json!({"success": true}),
            json!({"status": "success"}),
            json!({"result": {"success": true}}),
            json!({"result": {"status": "success"}}),
        ] {
            assert!(normalize(&response), "expected success for {response}");
        }
    }

    #[test]
    fn empty_response_is_failure() {
        assert!(!normalize(&json!({})));
    }

    #[test]
    fn explicit_failure_is_failure() {
        assert!(!normalize(&json!({"success": false})));
        assert!(!normalize(&json!({"status": "error", "message": "boom"})));
    }

    /// The editor reports missing objects as `{"error": "..."}` with no marker.
    #[test]
    fn error_only_shape_is_failure() {
        assert!(!normalize(&json!({"error": "GameObject not found: Ghost"})));
    }

    #[test]
    fn truthy_but_non_boolean_markers_fail_closed() {
        assert!(!normalize(&json!({"success": "true"})));
        assert!(!normalize(&json!({"success": 1})));
        assert!(!normalize(&json!({"status": "SUCCESS"})));
        assert!(!normalize(&json!({"status": true})));
    }

    #[test]
    fn non_object_responses_are_failure() {
        assert!(!normalize(&Value::Null));
        assert!(!normalize(&json!(true)));
        assert!(!normalize(&json!("success")));
        assert!(!normalize(&json!([{"success": true}])));
    }

    #[test]
    fn non_object_result_is_ignored() {
        assert!(!normalize(&json!({"result": true})));
        assert!(!normalize(&json!({"result": "success"})));
        assert!(!normalize(&json!({"result": [{"success": true}]})));
    }

    #[test]
    fn only_one_level_of_nesting_is_inspected() {
        assert!(!normalize(&json!({"result": {"result": {"success": true}}})));
    }

    #[test]
    fn top_level_success_wins_over_nested_failure() {
        assert!(normalize(&json!({"success": true, "result": {"success": false}})));
    }

    #[test]
    fn nested_success_recovers_top_level_failure() {
        assert!(normalize(&json!({"success": false, "result": {"status": "success"}})));
    }
}
