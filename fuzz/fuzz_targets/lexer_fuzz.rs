//! Fuzz test for the AgentLab Lexer
//!
//! Feeds arbitrary UTF-8 to the lexer looking for panics and bad spans.
//!
//! Run with: cargo +nightly fuzz run lexer_fuzz -- -max_total_time=60

#![no_main]

use agentlab_dsl::{LexError, Lexer, TokenKind};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    match Lexer::new(input).tokenize() {
        Ok(tokens) => {
            // The stream always ends with exactly one Eof.
            assert_eq!(tokens.last().map(|t| &t.kind), Some(&TokenKind::Eof));
            assert_eq!(tokens.iter().filter(|t| t.kind == TokenKind::Eof).count(), 1);

            for token in &tokens {
                assert!(token.span.start <= token.span.end, "span start after end");
                assert!(token.span.end <= input.len(), "span past end of input");
                assert!(token.span.line >= 1 && token.span.column >= 1);
            }
        }
        Err(LexError::InvalidNumber { text, line, column }) => {
            assert!(!text.is_empty());
            assert!(line >= 1 && column >= 1);
        }
        Err(_) => {}
    }
});
