#![no_main]

use libfuzzer_sys::fuzz_target;

use drydock_cataloger::distro::parse_os_release;

fuzz_target!(|input: String| {
    // 임의의 os-release 본문이 panic을 일으키지 않아야 한다
    if let Some(distro) = parse_os_release(&input) {
        // ID가 있었던 경우에만 식별된다
        assert!(!distro.name.is_empty() || input.contains("ID="));
    }
});
