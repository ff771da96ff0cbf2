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

//! Non-fatal diagnostics.
//!
//! Every pipeline stage and the data layer produce a value *and* a list of
//! diagnostics; later stages run best-effort on whatever the earlier stages
//! managed to produce. The accumulated list is attached to the final plan.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The stage that emitted a diagnostic.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum Stage {
    Lexer,
    Parse,
    Resolve,
    Expand,
    Calc,
    Data,
    Cache,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Lexer => "lexer",
            Self::Parse => "parse",
            Self::Resolve => "resolve",
            Self::Expand => "expand",
            Self::Calc => "calc",
            Self::Data => "data",
            Self::Cache => "cache",
        };
        f.write_str(s)
    }
}

/// Closed set of diagnostic codes.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum Code {
    /// A token had a recognizable shape but malformed content, e.g. a
    /// coordinate with out-of-range minutes.
    UnrecognizedToken,
    UnknownWaypoint,
    UnknownAirway,
    UnknownProcedure,
    TransitionNotFound,
    EndpointNotOnAirway,
    ProcedureContextMissing,
    /// Vincenty failed to converge; the leg fell back to haversine.
    NonConvergence,
    /// The wind triangle produced a non-positive ground speed.
    GroundSpeed,
    MissingCoordinates,
    SourceFetch,
    SourceParse,
    Validity,
    /// A parsed store failed checksum verification.
    ChecksumMismatch,
    /// The raw source bundle failed checksum verification.
    RawChecksumMismatch,
    UnknownSnapshotVersion,
    /// The authoritative source failed; the repository loaded fallback-only.
    Degraded,
    Cancelled,
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A single non-fatal finding.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    pub stage: Stage,
    pub code: Code,
    pub message: String,
    pub token: Option<String>,
}

impl Diagnostic {
    pub fn new(stage: Stage, code: Code, message: impl Into<String>) -> Self {
        Self {
            stage,
            code,
            message: message.into(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn parse(code: Code, message: impl Into<String>) -> Self {
        Self::new(Stage::Parse, code, message)
    }

    pub fn resolve(code: Code, message: impl Into<String>) -> Self {
        Self::new(Stage::Resolve, code, message)
    }

    pub fn expand(code: Code, message: impl Into<String>) -> Self {
        Self::new(Stage::Expand, code, message)
    }

    pub fn calc(code: Code, message: impl Into<String>) -> Self {
        Self::new(Stage::Calc, code, message)
    }

    pub fn data(code: Code, message: impl Into<String>) -> Self {
        Self::new(Stage::Data, code, message)
    }

    pub fn cache(code: Code, message: impl Into<String>) -> Self {
        Self::new(Stage::Cache, code, message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.token {
            Some(token) => write!(
                f,
                "[{}/{}] {} ({token})",
                self.stage, self.code, self.message
            ),
            None => write!(f, "[{}/{}] {}", self.stage, self.code, self.message),
        }
    }
}
