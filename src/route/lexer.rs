// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Joe Pearson
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::{Deserialize, Serialize};

/// One route token: the normalized uppercase text, its position in the
/// token list, and the original casing.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub index: usize,
    pub raw: String,
}

/// Splits a route string into tokens.
///
/// Trim, uppercase, split on whitespace runs, drop empty elements. Never
/// fails.
pub fn lex(input: &str) -> Vec<Token> {
    input
        .split_whitespace()
        .enumerate()
        .map(|(index, raw)| Token {
            text: raw.to_uppercase(),
            index,
            raw: raw.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_and_normalizes() {
        let tokens = lex("  kjfk   rbv\tQ430 \n air ");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["KJFK", "RBV", "Q430", "AIR"]);
        assert_eq!(tokens[0].raw, "kjfk");
        assert_eq!(tokens[3].index, 3);
    }

    #[test]
    fn empty_input_lexes_to_nothing() {
        assert!(lex("").is_empty());
        assert!(lex("   \t\n").is_empty());
    }

    #[test]
    fn relexing_normalized_text_is_idempotent() {
        let first = lex(" kjfk  rbv q430 ");
        let rejoined = first
            .iter()
            .map(|t| t.text.clone())
            .collect::<Vec<_>>()
            .join(" ");
        let second = lex(&rejoined);

        let texts = |tokens: &[Token]| {
            tokens
                .iter()
                .map(|t| (t.text.clone(), t.index))
                .collect::<Vec<_>>()
        };
        assert_eq!(texts(&first), texts(&second));
    }
}
