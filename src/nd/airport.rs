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

use geo::Point;
use serde::{Deserialize, Serialize};

use super::{NavPoint, SourceTag};

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum AirportType {
    Large,
    Medium,
    Small,
    Heliport,
    Seaplane,
    Closed,
}

/// An airport keyed by its ICAO code or, for fields without one, a local
/// identifier (3 characters containing a digit, e.g. `1B1`).
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Airport {
    pub ident: String,
    pub name: String,
    pub point: Point<f64>,
    pub elevation_ft: Option<f64>,
    pub municipality: String,
    pub country: String,
    pub iata: Option<String>,
    pub airport_type: AirportType,
    pub source: SourceTag,
}

impl NavPoint for Airport {
    fn ident(&self) -> &str {
        &self.ident
    }

    fn point(&self) -> Point<f64> {
        self.point
    }
}
