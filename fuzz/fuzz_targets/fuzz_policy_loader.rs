#![no_main]

use guardrailgen::config::PolicyLoader;
use guardrailgen_core::{ValidationMode, Validator, validate_policy};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(doc) = PolicyLoader::with_defaults().load_from_str(text) else {
        return;
    };

    // Both modes must agree on the first violation
    let fail_fast = validate_policy(&doc);
    let report = Validator::new(ValidationMode::CollectAll).validate(&doc);
    assert_eq!(fail_fast.err().as_ref(), report.first_error());
});
