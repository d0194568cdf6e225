#![no_main]
use std::collections::HashMap;

use libfuzzer_sys::fuzz_target;
use solr::{SlnItems, SlnParser, SlnWriter};

fuzz_target!(|data: &[u8]| {
    let mut parser = SlnParser::new();
    let solution = parser.parse_bytes(data, std::path::PathBuf::new(), SlnItems::ALL);
    let mut writer = SlnWriter::for_solution(Vec::new(), HashMap::new(), &solution);
    writer.write(solution.map()).unwrap();
    let written = writer.into_inner().unwrap();
    if std::str::from_utf8(data).is_ok() {
        assert_eq!(data, written.as_slice());
    }
});
