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

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum ProcedureKind {
    /// Departure procedure.
    Dp,
    /// Standard terminal arrival route.
    Star,
}

/// A named entry into a procedure's body from an en-route fix.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Transition {
    pub name: String,
    pub entry: String,
    pub fixes: Vec<String>,
}

/// A departure procedure or a STAR.
///
/// Reachable under two keys: the human-facing `name` (e.g. `CLPRR3`) and the
/// `computer_code` (e.g. `KCMH.CLPRR3`).
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Procedure {
    pub name: String,
    pub computer_code: String,
    pub kind: ProcedureKind,
    pub airport: String,
    pub body: Vec<String>,
    pub transitions: Vec<Transition>,
}

impl Procedure {
    pub fn transition(&self, name: &str) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.name == name)
    }

    /// Fix sequence to fly: the transition (when given) followed by the body.
    pub fn sequence(&self, transition: Option<&str>) -> Vec<String> {
        let mut fixes = Vec::new();
        if let Some(t) = transition.and_then(|name| self.transition(name)) {
            fixes.extend(t.fixes.iter().cloned());
        }
        fixes.extend(self.body.iter().cloned());
        fixes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clprr3() -> Procedure {
        Procedure {
            name: "CLPRR3".to_string(),
            computer_code: "KCMH.CLPRR3".to_string(),
            kind: ProcedureKind::Star,
            airport: "KCMH".to_string(),
            body: vec![
                "CLPRR".to_string(),
                "ARRAN".to_string(),
                "HOOPZ".to_string(),
            ],
            transitions: vec![Transition {
                name: "AIR".to_string(),
                entry: "AIR".to_string(),
                fixes: vec!["AIR".to_string(), "TUDOR".to_string()],
            }],
        }
    }

    #[test]
    fn sequence_without_transition_is_body() {
        assert_eq!(clprr3().sequence(None), vec!["CLPRR", "ARRAN", "HOOPZ"]);
    }

    #[test]
    fn sequence_prepends_transition_fixes() {
        assert_eq!(
            clprr3().sequence(Some("AIR")),
            vec!["AIR", "TUDOR", "CLPRR", "ARRAN", "HOOPZ"]
        );
    }

    #[test]
    fn unknown_transition_falls_back_to_body() {
        assert_eq!(
            clprr3().sequence(Some("NOPE")),
            vec!["CLPRR", "ARRAN", "HOOPZ"]
        );
    }
}
