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

//! Route expander.
//!
//! Materializes the resolved nodes into the waypoint sequence the
//! calculator flies. Airway segments slice the airway's fix sequence in
//! traversal order, procedures emit their transition and body fixes, and
//! consecutive duplicate identifiers collapse to one — that removes the
//! shared fix where an airway's last fix equals the next segment's first.

use super::resolver::{resolve_waypoint, ResolvedNode};
use crate::diag::{Code, Diagnostic};
use crate::nd::{Query, Waypoint};

/// Expands resolved nodes into the final waypoint sequence.
pub fn expand(nodes: &[ResolvedNode], q: &Query<'_>) -> (Vec<Waypoint>, Vec<Diagnostic>) {
    let mut waypoints: Vec<Waypoint> = Vec::new();
    let mut diagnostics = Vec::new();

    let mut emit = |wp: Waypoint, waypoints: &mut Vec<Waypoint>| {
        // consecutive duplicates collapse
        if waypoints.last().map(|last| last.ident == wp.ident) != Some(true) {
            waypoints.push(wp);
        }
    };

    for node in nodes {
        match node {
            ResolvedNode::Waypoint(wp) => emit(wp.clone(), &mut waypoints),

            ResolvedNode::Airway { from, to, airway } => {
                match airway.span(&from.ident, &to.ident) {
                    Some(sequence) => {
                        for ident in &sequence {
                            if ident == &from.ident {
                                emit(from.clone(), &mut waypoints);
                            } else if ident == &to.ident {
                                emit(to.clone(), &mut waypoints);
                            } else if let Some(wp) = resolve_waypoint(q, ident) {
                                emit(wp, &mut waypoints);
                            } else {
                                diagnostics.push(
                                    Diagnostic::expand(
                                        Code::UnknownWaypoint,
                                        format!(
                                            "fix {ident} on airway {} is not in the database",
                                            airway.ident
                                        ),
                                    )
                                    .with_token(ident),
                                );
                            }
                        }
                    }
                    None => {
                        diagnostics.push(
                            Diagnostic::expand(
                                Code::EndpointNotOnAirway,
                                format!(
                                    "{} or {} is not on airway {}",
                                    from.ident, to.ident, airway.ident
                                ),
                            )
                            .with_token(&airway.ident),
                        );
                        // fall back to a direct connection of the endpoints
                        emit(from.clone(), &mut waypoints);
                        emit(to.clone(), &mut waypoints);
                    }
                }
            }

            ResolvedNode::Procedure {
                procedure,
                transition,
            } => {
                for ident in procedure.sequence(transition.as_deref()) {
                    match resolve_waypoint(q, &ident) {
                        Some(wp) => emit(wp, &mut waypoints),
                        None => diagnostics.push(
                            Diagnostic::expand(
                                Code::UnknownWaypoint,
                                format!("fix {ident} of {} is not in the database", procedure.name),
                            )
                            .with_token(&ident),
                        ),
                    }
                }
            }

            // signals intent only; its neighbours connect
            ResolvedNode::Direct => {}
        }
    }

    (waypoints, diagnostics)
}
