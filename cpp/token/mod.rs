//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the posixutils-cpp project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// Token module - tokenizer, macros, directives and the preprocessing core
//

pub mod convert;
pub mod directive;
pub mod lexer;
pub mod macros;
pub mod preprocess;

// Re-export items used by the driver
pub use lexer::{show_token, token_type_name, Token, TokenType};
pub use preprocess::Preprocessor;
