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

//! Magnetic variation.
//!
//! The calculator only depends on the [`MagneticModel`] capability: given a
//! position, an altitude and a date it answers the east-positive variation
//! in degrees. [`Wmm`] backs it with the World Magnetic Model;
//! [`FixedVariation`] pins a value for tests and offline use.

use chrono::{Datelike, NaiveDate};
use geo::Point;
use log::warn;

/// Supplies magnetic variation (declination) at a point.
pub trait MagneticModel {
    /// East-positive variation in degrees, or `None` if the model cannot
    /// answer for the given inputs (e.g. a date outside its epoch).
    fn variation(&self, point: Point<f64>, altitude_ft: f64, date: NaiveDate) -> Option<f64>;
}

/// World Magnetic Model backed variation.
#[derive(Copy, Clone, Default, Debug)]
pub struct Wmm;

impl MagneticModel for Wmm {
    fn variation(&self, point: Point<f64>, altitude_ft: f64, date: NaiveDate) -> Option<f64> {
        use world_magnetic_model::time::Date;
        use world_magnetic_model::uom::si::angle::degree;
        use world_magnetic_model::uom::si::f32::{Angle, Length};
        use world_magnetic_model::uom::si::length::foot;
        use world_magnetic_model::GeomagneticField;

        let date = Date::from_ordinal_date(date.year(), date.ordinal() as u16).ok()?;

        match GeomagneticField::new(
            Length::new::<foot>(altitude_ft as f32),
            Angle::new::<degree>(point.y() as f32),
            Angle::new::<degree>(point.x() as f32),
            date,
        ) {
            Ok(field) => Some(field.declination().get::<degree>() as f64),
            Err(e) => {
                warn!("magnetic model unavailable at {point:?}: {e}");
                None
            }
        }
    }
}

/// A constant variation, east-positive degrees.
#[derive(Copy, Clone, Default, Debug)]
pub struct FixedVariation(pub f64);

impl MagneticModel for FixedVariation {
    fn variation(&self, _point: Point<f64>, _altitude_ft: f64, _date: NaiveDate) -> Option<f64> {
        Some(self.0)
    }
}
