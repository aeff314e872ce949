#![no_main]

use libfuzzer_sys::fuzz_target;
use vigil_abac::{AccessRequest, Condition, Policy};

fuzz_target!(|data: &[u8]| {
    // Convert bytes to UTF-8 string (ignore invalid UTF-8)
    if let Ok(json) = std::str::from_utf8(data) {
        // Parsing untrusted documents must never panic, only return Err
        if let Ok(policy) = Policy::from_json(json) {
            // Anything accepted must be accepted again after serialization
            let again = Policy::from_json(&policy.to_json());
            assert!(again.is_ok(), "serialized policy rejected: {again:?}");
        }
        let _ = AccessRequest::from_json(json);

        if let Ok(value) = serde_json::from_str::<serde_json::Value>(json) {
            if let Ok(condition) = Condition::from_value(&value) {
                let _ = condition.is_satisfied(Some(&value));
                let _ = condition.is_satisfied(None);
            }
        }
    }
});
