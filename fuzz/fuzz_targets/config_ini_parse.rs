//! Fuzz target for dataset config parsing.
//!
//! Feeds arbitrary text to every registered config parser version,
//! checking for panics, crashes, or hangs.

#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;
use showerset::io::ConfigParserRegistry;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let registry = ConfigParserRegistry::default();
    if let Ok(attrs) = registry.parse_str(text, Path::new("fuzz_config.ini")) {
        for version in registry.versions() {
            let _ = registry.render_string(&attrs, version);
        }
    }
});
