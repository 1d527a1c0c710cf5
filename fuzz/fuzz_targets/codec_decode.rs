#![no_main]

use libfuzzer_sys::fuzz_target;

use drydock_core::codec::{decode_source_metadata, encode_source_metadata};
use drydock_core::types::Scope;

fuzz_target!(|data: &[u8]| {
    // 임의 바이트 → JSON → 디코딩이 panic 없이 실패하거나 성공해야 한다
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else {
        return;
    };

    let Ok(decoded) = decode_source_metadata(&value) else {
        return;
    };

    // 디코딩에 성공한 값은 라운드트립이 안정적이어야 한다
    let scope = decoded.scope.unwrap_or(Scope::Squashed);
    let encoded = encode_source_metadata(&decoded.metadata, scope)
        .expect("re-encoding a decoded value must succeed");
    let again = decode_source_metadata(&encoded)
        .expect("decoding a freshly encoded value must succeed");
    assert_eq!(again.metadata, decoded.metadata);
});
