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

//! Winds aloft.
//!
//! Fetching winds from a forecast provider is outside the engine; the
//! calculator depends only on the [`WindProvider`] contract. Two local
//! implementations ship with the crate: [`CalmWinds`] and [`ConstantWind`].

use geo::Point;
use serde::{Deserialize, Serialize};

use crate::measurements::{Angle, Speed};

/// A wind vector: the direction the wind blows *from* and its speed.
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Wind {
    pub direction: Angle,
    pub speed: Speed,
}

impl Wind {
    pub fn new(direction: Angle, speed: Speed) -> Self {
        Self { direction, speed }
    }

    pub fn calm() -> Self {
        Self {
            direction: Angle::deg(0.0),
            speed: Speed::kt(0.0),
        }
    }
}

/// Winds-aloft forecast snapshot to request.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum ForecastPeriod {
    #[default]
    H06,
    H12,
    H24,
}

impl ForecastPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::H06 => "06",
            Self::H12 => "12",
            Self::H24 => "24",
        }
    }
}

/// Supplies a wind vector at a point and altitude.
pub trait WindProvider {
    fn wind_at(&self, point: Point<f64>, altitude_ft: f64, period: ForecastPeriod)
        -> Option<Wind>;
}

/// No wind anywhere.
#[derive(Copy, Clone, Default, Debug)]
pub struct CalmWinds;

impl WindProvider for CalmWinds {
    fn wind_at(
        &self,
        _point: Point<f64>,
        _altitude_ft: f64,
        _period: ForecastPeriod,
    ) -> Option<Wind> {
        Some(Wind::calm())
    }
}

/// The same wind vector everywhere; handy for tests and quick estimates.
#[derive(Copy, Clone, Debug)]
pub struct ConstantWind(pub Wind);

impl WindProvider for ConstantWind {
    fn wind_at(
        &self,
        _point: Point<f64>,
        _altitude_ft: f64,
        _period: ForecastPeriod,
    ) -> Option<Wind> {
        Some(self.0)
    }
}

/// Wind vectors around the filed altitude, recorded per leg for display.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct WindsAloft {
    pub levels: Vec<WindAtAltitude>,
}

#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct WindAtAltitude {
    pub altitude_ft: f64,
    pub wind: Option<Wind>,
}

impl WindsAloft {
    /// Samples the provider at the filed altitude and ±1000, ±2000 ft.
    pub fn sample(
        provider: &dyn WindProvider,
        point: Point<f64>,
        filed_ft: f64,
        period: ForecastPeriod,
    ) -> Self {
        let levels = [-2000.0, -1000.0, 0.0, 1000.0, 2000.0]
            .iter()
            .map(|offset| {
                let altitude_ft = filed_ft + offset;
                WindAtAltitude {
                    altitude_ft,
                    wind: provider.wind_at(point, altitude_ft, period),
                }
            })
            .collect();
        Self { levels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_covers_five_levels() {
        let wind = ConstantWind(Wind::new(Angle::deg(270.0), Speed::kt(35.0)));
        let aloft = WindsAloft::sample(&wind, Point::new(0.0, 0.0), 6500.0, ForecastPeriod::H12);

        assert_eq!(aloft.levels.len(), 5);
        assert_eq!(aloft.levels[0].altitude_ft, 4500.0);
        assert_eq!(aloft.levels[4].altitude_ft, 8500.0);
        assert!(aloft.levels.iter().all(|l| l.wind.is_some()));
    }
}
