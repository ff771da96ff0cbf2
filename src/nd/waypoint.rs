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

use super::{Airport, Fix, NavPoint, Navaid};

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum WaypointKind {
    Airport,
    Navaid,
    Fix,
    /// A synthetic point entered as a coordinate.
    Gps,
}

/// A resolved route point.
///
/// Waypoints are owned copies of the entity data they were resolved from, so
/// a plan stays valid across repository reloads.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Waypoint {
    pub ident: String,
    pub kind: WaypointKind,
    pub point: Point<f64>,
    pub elevation_ft: Option<f64>,
    /// East-positive magnetic variation published for the point, if any.
    pub mag_var: Option<f64>,
    pub reporting: bool,
}

impl Waypoint {
    pub fn from_airport(arpt: &Airport) -> Self {
        Self {
            ident: arpt.ident.clone(),
            kind: WaypointKind::Airport,
            point: arpt.point,
            elevation_ft: arpt.elevation_ft,
            mag_var: None,
            reporting: false,
        }
    }

    pub fn from_navaid(navaid: &Navaid) -> Self {
        Self {
            ident: navaid.ident.clone(),
            kind: WaypointKind::Navaid,
            point: navaid.point,
            elevation_ft: None,
            mag_var: None,
            reporting: false,
        }
    }

    pub fn from_fix(fix: &Fix) -> Self {
        Self {
            ident: fix.ident.clone(),
            kind: WaypointKind::Fix,
            point: fix.point,
            elevation_ft: None,
            mag_var: None,
            reporting: fix.reporting,
        }
    }

    pub fn gps(ident: impl Into<String>, point: Point<f64>) -> Self {
        Self {
            ident: ident.into(),
            kind: WaypointKind::Gps,
            point,
            elevation_ft: None,
            mag_var: None,
            reporting: false,
        }
    }
}

impl NavPoint for Waypoint {
    fn ident(&self) -> &str {
        &self.ident
    }

    fn point(&self) -> Point<f64> {
        self.point
    }
}
