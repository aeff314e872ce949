#![no_main]

use libfuzzer_sys::fuzz_target;
use vigil_abac::{AccessRequest, Policy, evaluate};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    // Input layout: request JSON, a newline, then one policy JSON per line
    let mut lines = text.lines();
    let Some(Ok(request)) = lines.next().map(AccessRequest::from_json) else {
        return;
    };
    let policies: Vec<Policy> = lines.filter_map(|line| Policy::from_json(line).ok()).collect();

    let forward = evaluate(policies.iter(), &request);
    let backward = evaluate(policies.iter().rev(), &request);
    assert_eq!(forward, backward, "decision depends on policy order");
});
