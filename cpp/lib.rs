//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the posixutils-cpp project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// Library interface for posixutils-cpp
//
// Exports the preprocessing pipeline (line source, tokenizer, macro
// expansion, lookahead) for use by the pcpp driver and by front-ends
// that want a token stream.
//

pub mod diag;
pub mod input;
pub mod strings;
pub mod token;
