#![no_main]

use libfuzzer_sys::fuzz_target;

use drydock_source::{SchemeHint, parse_scheme};

fuzz_target!(|input: String| {
    let (hint, rest) = parse_scheme(&input);

    // rest는 항상 원본의 suffix다
    assert!(input.ends_with(rest));

    // 접두어가 인식되었다면 원본이 해당 접두어로 시작해야 한다
    let prefix = match hint {
        SchemeHint::Docker => Some("docker:"),
        SchemeHint::DockerArchive => Some("docker-archive:"),
        SchemeHint::OciArchive => Some("oci-archive:"),
        SchemeHint::OciDir => Some("oci-dir:"),
        SchemeHint::Dir => Some("dir:"),
        SchemeHint::Auto => None,
    };
    if let Some(prefix) = prefix {
        assert!(input.starts_with(prefix));
        assert_eq!(rest.len(), input.len() - prefix.len());
    } else {
        assert_eq!(rest, input);
    }
});
