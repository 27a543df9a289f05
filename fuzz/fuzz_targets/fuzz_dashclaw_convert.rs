#![no_main]

use guardrailgen::dashclaw::{convert_policies, parse_export};
use guardrailgen_core::{Node, validate_policy};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(records) = parse_export(text) else {
        return;
    };
    if let Ok(doc) = convert_policies(&records, "fuzz") {
        let _ = validate_policy(&Node::from(&doc));
    }
});
