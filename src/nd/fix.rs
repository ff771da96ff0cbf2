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

use super::NavPoint;

/// A named waypoint without radio-navigation equipment.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Fix {
    pub ident: String,
    pub point: Point<f64>,
    pub reporting: bool,
    pub state: String,
    pub country: String,
}

impl NavPoint for Fix {
    fn ident(&self) -> &str {
        &self.ident
    }

    fn point(&self) -> Point<f64> {
        self.point
    }
}
