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

//! Route parser.
//!
//! Recognizes typed parse nodes with three-token lookahead. Airway
//! classification is dual: the `^[JVQTABGR][0-9]+$` shape works without any
//! database, and the token-type oracle catches airway identifiers the regex
//! cannot know about. After an airway triple the cursor advances by two,
//! landing on the `to` waypoint, so `A Q430 B Q430 C` parses as two segments
//! sharing `B`.

use once_cell::sync::Lazy;
use regex::Regex;

use super::lexer::Token;
use crate::diag::{Code, Diagnostic};
use crate::fc;
use crate::nd::{TokenKind, TokenTypes};

static AIRWAY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[JVQTABGR][0-9]+$").unwrap());
static PROC_HALF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{3,}\d*$").unwrap());
/// Without an oracle a procedure needs trailing digits, otherwise every
/// plain identifier of three letters or more would shadow as one.
static PROC_SHAPE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{3,}\d+$").unwrap());
static COORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4}|\d{6})([NS])?/(\d{5}|\d{7})([EW])?$").unwrap());

/// A typed parse node.
#[derive(Clone, PartialEq, Debug)]
pub enum ParseNode {
    Waypoint {
        token: Token,
    },
    Airway {
        from: Token,
        airway: Token,
        to: Token,
    },
    Procedure {
        transition: Option<String>,
        name: String,
        token: Token,
        explicit: bool,
    },
    Coordinate {
        lat: f64,
        lon: f64,
        token: Token,
    },
    Direct,
}

/// Parses tokens into nodes.
///
/// A pure function of the tokens and the token-type oracle; without an
/// oracle the regex fallbacks decide alone.
pub fn parse(
    tokens: &[Token],
    oracle: Option<&dyn TokenTypes>,
) -> (Vec<ParseNode>, Vec<Diagnostic>) {
    let mut nodes = Vec::new();
    let mut diagnostics = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];

        if token.text == "DCT" {
            nodes.push(ParseNode::Direct);
            i += 1;
            continue;
        }

        // airway triple: WAYPOINT AIRWAY WAYPOINT
        if i + 2 < tokens.len() {
            let middle = &tokens[i + 1];
            if is_airway(&middle.text, oracle)
                && is_waypoint_like(&token.text, oracle)
                && is_waypoint_like(&tokens[i + 2].text, oracle)
            {
                nodes.push(ParseNode::Airway {
                    from: token.clone(),
                    airway: middle.clone(),
                    to: tokens[i + 2].clone(),
                });
                // land on the `to` waypoint so chains share it
                i += 2;
                continue;
            }
        }

        // TRANSITION.PROCEDURE
        if let Some((transition, name)) = token.text.split_once('.') {
            if PROC_HALF_RE.is_match(transition) && PROC_HALF_RE.is_match(name) {
                nodes.push(ParseNode::Procedure {
                    transition: Some(transition.to_string()),
                    name: name.to_string(),
                    token: token.clone(),
                    explicit: true,
                });
                i += 1;
                continue;
            }
        }

        // procedure base
        let is_procedure = match oracle {
            Some(oracle) => {
                PROC_HALF_RE.is_match(&token.text)
                    && oracle.token_type(&token.text) == Some(TokenKind::Procedure)
            }
            None => PROC_SHAPE_RE.is_match(&token.text),
        };
        if is_procedure {
            nodes.push(ParseNode::Procedure {
                transition: None,
                name: token.text.clone(),
                token: token.clone(),
                explicit: false,
            });
            i += 1;
            continue;
        }

        // coordinate
        if token.text.contains('/') {
            match parse_coordinate(&token.text) {
                Some((lat, lon)) => nodes.push(ParseNode::Coordinate {
                    lat,
                    lon,
                    token: token.clone(),
                }),
                None => diagnostics.push(
                    Diagnostic::parse(
                        Code::UnrecognizedToken,
                        format!("{:?} is not a valid coordinate", token.text),
                    )
                    .with_token(&token.text),
                ),
            }
            i += 1;
            continue;
        }

        nodes.push(ParseNode::Waypoint {
            token: token.clone(),
        });
        i += 1;
    }

    (nodes, diagnostics)
}

fn is_airway(text: &str, oracle: Option<&dyn TokenTypes>) -> bool {
    AIRWAY_RE.is_match(text)
        || oracle
            .and_then(|o| o.token_type(text))
            .map(|kind| kind == TokenKind::Airway)
            .unwrap_or(false)
}

fn is_waypoint_like(text: &str, oracle: Option<&dyn TokenTypes>) -> bool {
    text != "DCT" && !is_airway(text, oracle)
}

/// Parses `DDMM(SS)?[NS]?/DDDMM(SS)?[EW]?` into decimal degrees.
///
/// A missing hemisphere suffix means north / east.
fn parse_coordinate(text: &str) -> Option<(f64, f64)> {
    let caps = COORD_RE.captures(text)?;

    let lat = dms_value(&caps[1], 2)?;
    if lat > 90.0 {
        return None;
    }
    let lat = match caps.get(2).map(|m| m.as_str()) {
        Some("S") => -lat,
        _ => lat,
    };

    let lon = dms_value(&caps[3], 3)?;
    if lon > 180.0 {
        return None;
    }
    let lon = match caps.get(4).map(|m| m.as_str()) {
        Some("W") => -lon,
        _ => lon,
    };

    Some((lat, lon))
}

fn dms_value(digits: &str, degree_width: usize) -> Option<f64> {
    let degrees: u16 = digits[..degree_width].parse().ok()?;
    let minutes: u8 = digits[degree_width..degree_width + 2].parse().ok()?;
    let seconds: u8 = if digits.len() > degree_width + 2 {
        digits[degree_width + 2..].parse().ok()?
    } else {
        0
    };

    if minutes >= 60 || seconds >= 60 {
        return None;
    }
    Some(fc::dms_to_decimal(degrees, minutes, seconds))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::super::lexer::lex;
    use super::*;

    /// Token-type oracle backed by a plain map, standing in for the query
    /// engine.
    struct MapOracle(HashMap<String, TokenKind>);

    impl MapOracle {
        fn new(entries: &[(&str, TokenKind)]) -> Self {
            Self(
                entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), *v))
                    .collect(),
            )
        }
    }

    impl TokenTypes for MapOracle {
        fn token_type(&self, ident: &str) -> Option<TokenKind> {
            self.0.get(ident).copied()
        }
    }

    fn texts(node: &ParseNode) -> Vec<String> {
        match node {
            ParseNode::Waypoint { token } => vec![token.text.clone()],
            ParseNode::Airway { from, airway, to } => {
                vec![from.text.clone(), airway.text.clone(), to.text.clone()]
            }
            ParseNode::Procedure { name, .. } => vec![name.clone()],
            ParseNode::Coordinate { token, .. } => vec![token.text.clone()],
            ParseNode::Direct => vec!["DCT".to_string()],
        }
    }

    #[test]
    fn parses_direct_and_waypoints() {
        let (nodes, diagnostics) = parse(&lex("KJFK DCT KORD"), None);
        assert!(diagnostics.is_empty());
        assert_eq!(nodes.len(), 3);
        assert!(matches!(nodes[1], ParseNode::Direct));
    }

    #[test]
    fn parses_airway_triple_by_shape_alone() {
        let (nodes, _) = parse(&lex("RBV Q430 AIR"), None);
        assert_eq!(nodes.len(), 2);
        assert_eq!(texts(&nodes[0]), vec!["RBV", "Q430", "AIR"]);
        // cursor lands on AIR which re-parses as a waypoint; the expander
        // collapses the duplicate
        assert_eq!(texts(&nodes[1]), vec!["AIR"]);
    }

    #[test]
    fn airway_chain_shares_the_middle_waypoint() {
        let (nodes, _) = parse(&lex("PAYGE Q430 AIR Q430 FNT"), None);
        let airways: Vec<&ParseNode> = nodes
            .iter()
            .filter(|n| matches!(n, ParseNode::Airway { .. }))
            .collect();
        assert_eq!(airways.len(), 2);
        assert_eq!(texts(airways[0]), vec!["PAYGE", "Q430", "AIR"]);
        assert_eq!(texts(airways[1]), vec!["AIR", "Q430", "FNT"]);
    }

    #[test]
    fn oracle_classifies_non_regex_airways() {
        let oracle = MapOracle::new(&[("UL620", TokenKind::Airway)]);
        let (nodes, _) = parse(&lex("NIK UL620 TOLSA"), Some(&oracle));
        assert!(matches!(nodes[0], ParseNode::Airway { .. }));

        // without the oracle the same route is three waypoints
        let (nodes, _) = parse(&lex("NIK UL620 TOLSA"), None);
        assert_eq!(nodes.len(), 3);
        assert!(nodes
            .iter()
            .all(|n| matches!(n, ParseNode::Waypoint { .. })));
    }

    #[test]
    fn parses_explicit_transition() {
        let (nodes, _) = parse(&lex("HIDEY.HIDEY1"), None);
        match &nodes[0] {
            ParseNode::Procedure {
                transition,
                name,
                explicit,
                ..
            } => {
                assert_eq!(transition.as_deref(), Some("HIDEY"));
                assert_eq!(name, "HIDEY1");
                assert!(*explicit);
            }
            other => panic!("expected procedure, got {other:?}"),
        }
    }

    #[test]
    fn oracle_decides_procedure_bases() {
        let oracle = MapOracle::new(&[("CLPRR3", TokenKind::Procedure)]);
        let (nodes, _) = parse(&lex("CLPRR3"), Some(&oracle));
        assert!(matches!(nodes[0], ParseNode::Procedure { .. }));

        // a plain airport ident never parses as a procedure, oracle or not
        let oracle = MapOracle::new(&[("KJFK", TokenKind::Airport)]);
        let (nodes, _) = parse(&lex("KJFK"), Some(&oracle));
        assert!(matches!(nodes[0], ParseNode::Waypoint { .. }));
    }

    #[test]
    fn shape_mode_requires_trailing_digits_for_procedures() {
        let (nodes, _) = parse(&lex("CLPRR3 KJFK"), None);
        assert!(matches!(nodes[0], ParseNode::Procedure { .. }));
        assert!(matches!(nodes[1], ParseNode::Waypoint { .. }));
    }

    #[test]
    fn parses_coordinates_with_and_without_hemispheres() {
        let (nodes, diagnostics) = parse(&lex("4030N/07345W 4030/07345"), None);
        assert!(diagnostics.is_empty());

        match nodes[0] {
            ParseNode::Coordinate { lat, lon, .. } => {
                assert!((lat - 40.5).abs() < 1e-9);
                assert!((lon + 73.75).abs() < 1e-9);
            }
            ref other => panic!("expected coordinate, got {other:?}"),
        }
        match nodes[1] {
            // no suffix means north / east
            ParseNode::Coordinate { lat, lon, .. } => {
                assert!(lat > 0.0);
                assert!(lon > 0.0);
            }
            ref other => panic!("expected coordinate, got {other:?}"),
        }
    }

    #[test]
    fn parses_coordinate_with_seconds() {
        let (nodes, _) = parse(&lex("403045N/0734530W"), None);
        match nodes[0] {
            ParseNode::Coordinate { lat, .. } => {
                assert!((lat - (40.0 + 30.0 / 60.0 + 45.0 / 3600.0)).abs() < 1e-9);
            }
            ref other => panic!("expected coordinate, got {other:?}"),
        }
    }

    #[test]
    fn malformed_coordinate_is_diagnosed_not_fatal() {
        let (nodes, diagnostics) = parse(&lex("KJFK 4090N/07345W KORD"), None);
        // 90 minutes is out of range
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, Code::UnrecognizedToken);
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn parse_is_deterministic() {
        let tokens = lex("RBV Q430 AIR CLPRR3 KCMH");
        let oracle = MapOracle::new(&[("CLPRR3", TokenKind::Procedure)]);
        let (a, _) = parse(&tokens, Some(&oracle));
        let (b, _) = parse(&tokens, Some(&oracle));
        assert_eq!(a, b);
    }
}
