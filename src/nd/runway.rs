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

/// A runway, identified by its two end designators (e.g. `04L`/`22R`).
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Runway {
    pub le_ident: String,
    pub he_ident: String,
    pub length_ft: Option<f64>,
    pub surface: String,
}

/// A published radio frequency at an airport.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Frequency {
    /// Facility kind (`TWR`, `GND`, `ATIS`, …). The set is open; sources
    /// publish free-form designators.
    pub kind: String,
    pub mhz: f64,
}

/// Controlled-airspace classification around an airport.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct AirspaceClass {
    pub class: String,
    pub hours: Option<String>,
}
