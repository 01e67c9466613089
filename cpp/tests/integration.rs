//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the posixutils-cpp project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// Integration test harness for pcpp
//
// Test organization:
// - preprocessor/macros.rs: macro expansion, stringification, pasting
// - preprocessor/directives.rs: conditionals, includes, #error, #line
// - preprocessor/output.rs: -E text output and stream fidelity
//

mod common;
mod preprocessor;
