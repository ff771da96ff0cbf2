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

//! Route resolver.
//!
//! Obtains coordinates and canonical entity data for each parse node.
//! Waypoints resolve with the Fix → Navaid → Airport preference; unresolved
//! three-letter tokens get one more chance through the IATA → ICAO secondary
//! lookup. Procedures resolve through a ladder of context lookups using the
//! node's position to prefer departures near the route start and STARs near
//! its end.

use std::rc::Rc;

use geo::Point;
use log::debug;

use super::parser::ParseNode;
use crate::diag::{Code, Diagnostic};
use crate::nd::{Airway, Procedure, ProcedureKind, Query, Waypoint};

/// A parse node with entity data attached.
#[derive(Clone, Debug)]
pub enum ResolvedNode {
    Waypoint(Waypoint),
    Airway {
        from: Waypoint,
        to: Waypoint,
        airway: Rc<Airway>,
    },
    Procedure {
        procedure: Rc<Procedure>,
        transition: Option<String>,
    },
    Direct,
}

/// Resolves a waypoint identifier with the Fix → Navaid → Airport lookup
/// preference, then the IATA secondary lookup.
pub(crate) fn resolve_waypoint(q: &Query<'_>, ident: &str) -> Option<Waypoint> {
    if let Some(fix) = q.fix(ident) {
        return Some(Waypoint::from_fix(&fix));
    }
    if let Some(navaid) = q.navaid(ident) {
        return Some(Waypoint::from_navaid(&navaid));
    }
    if let Some(arpt) = q.airport(ident) {
        return Some(Waypoint::from_airport(&arpt));
    }
    if ident.len() == 3 && ident.chars().all(|c| c.is_ascii_alphabetic()) {
        if let Some(icao) = q.iata_to_icao(ident) {
            if let Some(arpt) = q.airport(icao) {
                debug!("{ident} resolved through IATA to {icao}");
                return Some(Waypoint::from_airport(&arpt));
            }
        }
    }
    None
}

/// Resolves all nodes, emitting non-fatal diagnostics for anything unknown.
pub fn resolve(nodes: &[ParseNode], q: &Query<'_>) -> (Vec<ResolvedNode>, Vec<Diagnostic>) {
    let mut resolved = Vec::new();
    let mut diagnostics = Vec::new();

    // airports mentioned as plain waypoints, with their node positions, for
    // procedure context
    let route_airports: Vec<(usize, String)> = nodes
        .iter()
        .enumerate()
        .filter_map(|(i, node)| match node {
            ParseNode::Waypoint { token } if q.airport(&token.text).is_some() => {
                Some((i, token.text.clone()))
            }
            _ => None,
        })
        .collect();

    for (position, node) in nodes.iter().enumerate() {
        match node {
            ParseNode::Waypoint { token } => match resolve_waypoint(q, &token.text) {
                Some(wp) => resolved.push(ResolvedNode::Waypoint(wp)),
                None => diagnostics.push(
                    Diagnostic::resolve(
                        Code::UnknownWaypoint,
                        format!("unknown waypoint {}", token.text),
                    )
                    .with_token(&token.text),
                ),
            },

            ParseNode::Airway { from, airway, to } => {
                let from_wp = resolve_waypoint(q, &from.text);
                let to_wp = resolve_waypoint(q, &to.text);

                if from_wp.is_none() {
                    diagnostics.push(
                        Diagnostic::resolve(
                            Code::UnknownWaypoint,
                            format!("unknown waypoint {}", from.text),
                        )
                        .with_token(&from.text),
                    );
                }
                if to_wp.is_none() {
                    diagnostics.push(
                        Diagnostic::resolve(
                            Code::UnknownWaypoint,
                            format!("unknown waypoint {}", to.text),
                        )
                        .with_token(&to.text),
                    );
                }

                match (from_wp, to_wp, q.airway(&airway.text)) {
                    (Some(from), Some(to), Some(awy)) => resolved.push(ResolvedNode::Airway {
                        from,
                        to,
                        airway: awy,
                    }),
                    (from, to, awy) => {
                        if awy.is_none() {
                            diagnostics.push(
                                Diagnostic::resolve(
                                    Code::UnknownAirway,
                                    format!("unknown airway {}", airway.text),
                                )
                                .with_token(&airway.text),
                            );
                        }
                        // degrade to whichever endpoints resolved so the
                        // route keeps its continuity
                        if let Some(from) = from {
                            resolved.push(ResolvedNode::Waypoint(from));
                        }
                        if let Some(to) = to {
                            resolved.push(ResolvedNode::Waypoint(to));
                        }
                    }
                }
            }

            ParseNode::Procedure {
                transition,
                name,
                token,
                ..
            } => {
                match resolve_procedure(q, name, position, nodes.len(), &route_airports) {
                    Some(procedure) => {
                        let transition = match transition {
                            Some(t) if procedure.transition(t).is_none() => {
                                diagnostics.push(
                                    Diagnostic::resolve(
                                        Code::TransitionNotFound,
                                        format!(
                                            "transition {t} not found for {}",
                                            procedure.name
                                        ),
                                    )
                                    .with_token(&token.text),
                                );
                                None
                            }
                            other => other.clone(),
                        };
                        resolved.push(ResolvedNode::Procedure {
                            procedure,
                            transition,
                        });
                    }
                    None => diagnostics.push(
                        Diagnostic::resolve(
                            Code::UnknownProcedure,
                            format!("unknown procedure {name}"),
                        )
                        .with_token(&token.text),
                    ),
                }
            }

            ParseNode::Coordinate { lat, lon, token } => {
                resolved.push(ResolvedNode::Waypoint(Waypoint::gps(
                    &token.text,
                    Point::new(*lon, *lat),
                )));
            }

            ParseNode::Direct => resolved.push(ResolvedNode::Direct),
        }
    }

    (resolved, diagnostics)
}

/// The procedure lookup ladder: exact, `NAME.PROCEDURE`, `PROCEDURE.NAME`,
/// `AIRPORT.PROCEDURE` with the adjacent route airport, then
/// `AIRPORT.NAME.PROCEDURE`.
fn resolve_procedure(
    q: &Query<'_>,
    name: &str,
    position: usize,
    total: usize,
    route_airports: &[(usize, String)],
) -> Option<Rc<Procedure>> {
    // DPs belong near the start of the route, STARs near its end
    let preferred_kind = if position * 2 < total {
        ProcedureKind::Dp
    } else {
        ProcedureKind::Star
    };

    let nearest_airport = route_airports
        .iter()
        .min_by_key(|(i, _)| i.abs_diff(position))
        .map(|(_, ident)| ident.as_str());

    let mut candidates: Vec<Rc<Procedure>> = Vec::new();
    let mut push = |proc: Rc<Procedure>, candidates: &mut Vec<Rc<Procedure>>| {
        if !candidates
            .iter()
            .any(|c| c.computer_code == proc.computer_code)
        {
            candidates.push(proc);
        }
    };

    // 1. exact match on the token
    if let Some(proc) = q.procedure(name) {
        push(proc, &mut candidates);
    }

    // 2. NAME.PROCEDURE and 3. PROCEDURE.NAME against the computer codes
    let suffix = format!(".{name}");
    let prefix = format!("{name}.");
    for proc in q.procedures() {
        if proc.computer_code.ends_with(&suffix) || proc.computer_code.starts_with(&prefix) {
            push(Rc::clone(proc), &mut candidates);
        }
    }

    // 4. AIRPORT.PROCEDURE and 5. AIRPORT.NAME.PROCEDURE with route context
    if let Some(airport) = nearest_airport {
        if let Some(proc) = q.procedure(&format!("{airport}.{name}")) {
            push(proc, &mut candidates);
        }
        let airport_prefix = format!("{airport}.");
        for proc in q.procedures() {
            if proc.computer_code.starts_with(&airport_prefix)
                && proc.computer_code.ends_with(&suffix)
            {
                push(Rc::clone(proc), &mut candidates);
            }
        }
    }

    // ladder order breaks ties; a candidate at the adjacent airport beats
    // one that merely matches the positional kind preference
    let score = |p: &Procedure| -> u8 {
        let mut score = 0;
        if nearest_airport == Some(p.airport.as_str()) {
            score += 2;
        }
        if p.kind == preferred_kind {
            score += 1;
        }
        score
    };

    let mut best: Option<&Rc<Procedure>> = None;
    for candidate in &candidates {
        match best {
            Some(current) if score(current) >= score(candidate) => {}
            _ => best = Some(candidate),
        }
    }
    best.map(Rc::clone)
}

#[cfg(test)]
mod tests {
    use super::super::lexer::lex;
    use super::super::parser::parse;
    use super::*;
    use crate::nd::{
        Airport, AirportType, Fix, NavigationData, QueryIndex, SourceTag, Transition,
        WaypointKind,
    };

    fn nd() -> NavigationData {
        let mut nd = NavigationData::new();
        nd.add_airport(Airport {
            ident: "KCMH".to_string(),
            name: "John Glenn Columbus Intl".to_string(),
            point: Point::new(-82.891944, 39.998056),
            elevation_ft: Some(815.0),
            municipality: "Columbus".to_string(),
            country: "US".to_string(),
            iata: Some("CMH".to_string()),
            airport_type: AirportType::Medium,
            source: SourceTag::Nasr,
        });
        nd.add_fix(Fix {
            ident: "CLPRR".to_string(),
            point: Point::new(-82.2173, 40.3071),
            reporting: true,
            state: "OH".to_string(),
            country: "US".to_string(),
        });
        nd.add_airway(Airway {
            ident: "Q430".to_string(),
            fixes: vec!["CLPRR".to_string()],
        });
        nd.add_procedure(Procedure {
            name: "CLPRR3".to_string(),
            computer_code: "KCMH.CLPRR3".to_string(),
            kind: ProcedureKind::Star,
            airport: "KCMH".to_string(),
            body: vec!["CLPRR".to_string()],
            transitions: vec![Transition {
                name: "AIR".to_string(),
                entry: "AIR".to_string(),
                fixes: vec!["AIR".to_string()],
            }],
        });
        nd
    }

    fn with_query<T>(nd: &NavigationData, f: impl FnOnce(Query<'_>) -> T) -> T {
        let index = QueryIndex::build(nd);
        f(Query::new(nd, &index))
    }

    #[test]
    fn waypoint_preference_is_fix_first() {
        let mut nd = nd();
        // an airport sharing an ident with a fix: the fix wins resolution
        nd.add_airport(Airport {
            ident: "CLPRR".to_string(),
            name: "Clipper Field".to_string(),
            point: Point::new(0.0, 0.0),
            elevation_ft: None,
            municipality: String::new(),
            country: "US".to_string(),
            iata: None,
            airport_type: AirportType::Small,
            source: SourceTag::Nasr,
        });

        with_query(&nd, |q| {
            let wp = resolve_waypoint(&q, "CLPRR").unwrap();
            assert_eq!(wp.kind, WaypointKind::Fix);
        });
    }

    #[test]
    fn iata_codes_resolve_through_secondary_lookup() {
        let nd = nd();
        with_query(&nd, |q| {
            let wp = resolve_waypoint(&q, "CMH").unwrap();
            assert_eq!(wp.ident, "KCMH");
            assert_eq!(wp.kind, WaypointKind::Airport);
        });
    }

    #[test]
    fn unresolved_token_is_a_diagnostic_not_an_error() {
        let nd = nd();
        with_query(&nd, |q| {
            let (nodes, _) = parse(&lex("KCMH ZZZZZZ CLPRR"), Some(&q));
            let (resolved, diagnostics) = resolve(&nodes, &q);

            assert_eq!(resolved.len(), 2);
            assert_eq!(diagnostics.len(), 1);
            assert_eq!(diagnostics[0].code, Code::UnknownWaypoint);
            assert_eq!(diagnostics[0].token.as_deref(), Some("ZZZZZZ"));
        });
    }

    #[test]
    fn procedure_resolves_through_airport_context() {
        let mut nd = nd();
        // a same-named STAR at another airport claims the bare name key, so
        // only the AIRPORT.PROCEDURE context lookup can pick the right one
        nd.add_procedure(Procedure {
            name: "TRFIC2".to_string(),
            computer_code: "KLAX.TRFIC2".to_string(),
            kind: ProcedureKind::Star,
            airport: "KLAX".to_string(),
            body: vec!["TRFIC".to_string()],
            transitions: Vec::new(),
        });
        nd.add_procedure(Procedure {
            name: "TRFIC2".to_string(),
            computer_code: "KCMH.TRFIC2".to_string(),
            kind: ProcedureKind::Star,
            airport: "KCMH".to_string(),
            body: vec!["CLPRR".to_string()],
            transitions: Vec::new(),
        });

        with_query(&nd, |q| {
            let (nodes, _) = parse(&lex("CLPRR TRFIC2 KCMH"), Some(&q));
            let (resolved, diagnostics) = resolve(&nodes, &q);

            assert!(diagnostics.is_empty());
            assert!(resolved.iter().any(|n| matches!(
                n,
                ResolvedNode::Procedure { procedure, .. } if procedure.computer_code == "KCMH.TRFIC2"
            )));
        });
    }

    #[test]
    fn missing_transition_degrades_to_body_with_diagnostic() {
        let nd = nd();
        with_query(&nd, |q| {
            let (nodes, _) = parse(&lex("NOPE.CLPRR3 KCMH"), Some(&q));
            let (resolved, diagnostics) = resolve(&nodes, &q);

            assert!(diagnostics
                .iter()
                .any(|d| d.code == Code::TransitionNotFound));
            assert!(resolved.iter().any(|n| matches!(
                n,
                ResolvedNode::Procedure { transition: None, .. }
            )));
        });
    }

    #[test]
    fn unknown_airway_degrades_to_endpoints() {
        let nd = nd();
        with_query(&nd, |q| {
            let (nodes, _) = parse(&lex("CLPRR J999 KCMH"), Some(&q));
            let (resolved, diagnostics) = resolve(&nodes, &q);

            assert!(diagnostics.iter().any(|d| d.code == Code::UnknownAirway));
            let idents: Vec<&str> = resolved
                .iter()
                .filter_map(|n| match n {
                    ResolvedNode::Waypoint(wp) => Some(wp.ident.as_str()),
                    _ => None,
                })
                .collect();
            assert_eq!(idents, vec!["CLPRR", "KCMH", "KCMH"]);
        });
    }
}
