#![no_main]

use bearer_auth::token::{decode_token, extract_bearer_token};
use libfuzzer_sys::fuzz_target;

// Header extraction and structural decoding must never panic, whatever the
// header bytes look like.
fuzz_target!(|data: &[u8]| {
    let Ok(header) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(raw) = extract_bearer_token(Some(header)) {
        let _ = decode_token(raw);
    }
    let _ = decode_token(header);
});
