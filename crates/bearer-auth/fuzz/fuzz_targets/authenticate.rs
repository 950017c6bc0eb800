#![no_main]

use bearer_auth::{AuthConfig, BearerAuthenticator};
use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;

// base64("fuzz-secret-fuzz-secret-fuzz-sec")
const SECRET_B64: &str = "ZnV6ei1zZWNyZXQtZnV6ei1zZWNyZXQtZnV6ei1zZWM=";

fn authenticator() -> &'static BearerAuthenticator {
    static AUTH: OnceLock<BearerAuthenticator> = OnceLock::new();
    AUTH.get_or_init(|| {
        BearerAuthenticator::builder(AuthConfig {
            realm_authentication: false,
            token_cache_size: 16,
            ..AuthConfig::with_secret_key(SECRET_B64)
        })
        .build()
        .expect("fuzz configuration is valid")
    })
}

// Random headers are never accepted: nobody outside this file knows the key.
fuzz_target!(|data: &[u8]| {
    let Ok(header) = std::str::from_utf8(data) else {
        return;
    };

    assert!(!authenticator().authenticate(Some(header)).is_accepted());
});
