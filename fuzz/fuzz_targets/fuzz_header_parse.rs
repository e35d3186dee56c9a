#![no_main]

use libfuzzer_sys::fuzz_target;

use halcyon_types::Header;

// Header files handed to the CLI must fail cleanly on malformed input.
fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(header) = toml::from_str::<Header>(text) {
            // Whatever parsed must serialize again.
            let _ = toml::to_string(&header);
        }
    }
});
