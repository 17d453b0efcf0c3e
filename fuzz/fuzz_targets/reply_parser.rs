//! Fuzz target for control-port reply parsing
//!
//! Feeds arbitrary bytes to the line parser and the full reply reader. Any
//! outcome is acceptable except a panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use torctl::control::{read_reply, ReplyLine};

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        for line in text.split('\n') {
            let _ = ReplyLine::parse(line);
        }
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime");

    runtime.block_on(async {
        let mut reader = data;
        // Keep reading frames until the input is exhausted or framing breaks
        while !reader.is_empty() {
            match read_reply(&mut reader).await {
                Ok(reply) => {
                    let _ = reply.body();
                }
                Err(_) => break,
            }
        }
    });
});
