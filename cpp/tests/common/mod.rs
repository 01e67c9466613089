//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the posixutils-cpp project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// Common test utilities for pcpp integration tests
//

use plib::testing::run_test_base;
use std::process::Output;

/// Run pcpp with the given arguments, feeding `stdin` to it.
pub fn run_pcpp(args: &[&str], stdin: &str) -> Output {
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    run_test_base("pcpp", &args, stdin.as_bytes())
}

/// Preprocess source from stdin with -E and return the output text.
pub fn preprocess_text(src: &str) -> String {
    let out = run_pcpp(&["-E", "-"], src);
    assert!(
        out.status.success(),
        "pcpp -E failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8(out.stdout).expect("pcpp output not UTF-8")
}

/// Run the default token-dump mode and parse its lines into
/// (kind, text) pairs.
pub fn token_stream(src: &str) -> Vec<(String, String)> {
    token_stream_with_args(&["-"], src)
}

pub fn token_stream_with_args(args: &[&str], src: &str) -> Vec<(String, String)> {
    let out = run_pcpp(args, src);
    assert!(
        out.status.success(),
        "pcpp failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    parse_dump(&String::from_utf8(out.stdout).expect("pcpp output not UTF-8"))
}

/// The dump format is "KIND         text": a kind padded to 12 columns,
/// one space, then the token text.
pub fn parse_dump(dump: &str) -> Vec<(String, String)> {
    dump.lines()
        .map(|line| {
            let kind = line.split_whitespace().next().unwrap_or("").to_string();
            let text = line.get(13..).unwrap_or("").to_string();
            (kind, text)
        })
        .collect()
}

/// Just the token texts of the dump.
pub fn token_texts(src: &str) -> Vec<String> {
    token_stream(src).into_iter().map(|(_, t)| t).collect()
}
