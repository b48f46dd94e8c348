#![no_main]

use libfuzzer_sys::fuzz_target;

use docmap::parser::DocumentationParser;

fuzz_target!(|data: &[u8]| {
    let html = String::from_utf8_lossy(data);

    // Parsing must never panic, whatever the markup
    let parser = DocumentationParser::default();
    let _ = futures::executor::block_on(parser.parse_documentation(&html, "https://example.com/docs"));
    let _ = futures::executor::block_on(parser.parse_documentation(&html, "https://docs.aws.amazon.com"));
});
