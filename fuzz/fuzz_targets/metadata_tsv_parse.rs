//! Fuzz target for metadata TSV parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use showerset::io::{from_metadata_tsv_slice, to_metadata_tsv_string};

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(table) = from_metadata_tsv_slice(data, None) {
        let _ = to_metadata_tsv_string(&table.rows, &table.field_order);
    }
});
