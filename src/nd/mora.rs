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
pub enum MoraSource {
    Authoritative,
    /// Derived from elevation data where no published value exists.
    TerrainDerived,
}

/// Minimum off-route altitude over one 1°×1° cell.
///
/// The cell at SW corner `(lat, lon)` covers the half-open region
/// `[lat, lat+1) × [lon, lon+1)`. The value already includes the standard
/// 1000 ft obstacle clearance buffer.
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct MoraCell {
    pub lat: i16,
    pub lon: i16,
    pub mora_ft: f64,
    pub source: MoraSource,
}

impl MoraCell {
    pub fn key(&self) -> (i16, i16) {
        (self.lat, self.lon)
    }
}
