#![no_main]

use libfuzzer_sys::fuzz_target;
use yarrow::ast::SourceLocation;
use yarrow::frontend::{lexer, parser};

fuzz_target!(|data: &[u8]| {
    // Convert bytes to UTF-8 string (ignore invalid UTF-8)
    if let Ok(s) = std::str::from_utf8(data) {
        let location = SourceLocation::new("fuzz", 1, 1);
        // Fuzz the lexer
        if lexer::lex(s, &location).is_ok() {
            // If lexing succeeds, fuzz each embedded grammar
            let _ = parser::parse_type(s, &location);
            let _ = parser::parse_pattern(s, &location);
            let _ = parser::parse_expression(s, &location);
        }
    }
});
