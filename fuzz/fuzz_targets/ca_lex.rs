#![no_main]

use hlasm_syntax::ca::lex;
use libfuzzer_sys::fuzz_target;

const MAX_SOURCE_BYTES: usize = 4096;

fuzz_target!(|data: &[u8]| {
    let capped = &data[..data.len().min(MAX_SOURCE_BYTES)];
    let source = String::from_utf8_lossy(capped);
    let tokens = lex(&source);

    let len = source.len();
    for tok in &tokens {
        let range = tok.range;
        assert!(usize::from(range.start()) <= usize::from(range.end()));
        assert!(usize::from(range.end()) <= len);
    }
});
