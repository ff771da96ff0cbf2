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

//! Typed quantities used by the calculator.
//!
//! The wrappers keep the leg arithmetic honest: a [`Length`] divided by a
//! [`Speed`] is a [`Duration`], an [`Angle`] stays normalized to `[0, 360)`.

use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

use serde::{Deserialize, Serialize};

pub const METERS_PER_NM: f64 = 1852.0;

/// An angle in degrees, normalized to `[0, 360)`.
///
/// Negative inputs wrap: `Angle::deg(-30.0)` is 330°.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Default, Serialize, Deserialize)]
pub struct Angle {
    degrees: f64,
}

impl Angle {
    pub fn deg(value: f64) -> Self {
        Self {
            degrees: value.rem_euclid(360.0),
        }
    }

    pub fn from_radians(value: f64) -> Self {
        Self::deg(value.to_degrees())
    }

    pub fn degrees(&self) -> f64 {
        self.degrees
    }

    pub fn radians(&self) -> f64 {
        self.degrees.to_radians()
    }

    /// The signed difference `self − other` in `(-180, 180]`.
    pub fn signed_diff(&self, other: Angle) -> f64 {
        let mut d = self.degrees - other.degrees;
        while d <= -180.0 {
            d += 360.0;
        }
        while d > 180.0 {
            d -= 360.0;
        }
        d
    }
}

impl Add for Angle {
    type Output = Angle;

    fn add(self, rhs: Self) -> Self::Output {
        Angle::deg(self.degrees + rhs.degrees)
    }
}

impl Sub for Angle {
    type Output = Angle;

    fn sub(self, rhs: Self) -> Self::Output {
        Angle::deg(self.degrees - rhs.degrees)
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03.0}°", self.degrees)
    }
}

/// A length stored in nautical miles.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Default, Serialize, Deserialize)]
pub struct Length {
    nm: f64,
}

impl Length {
    pub const fn nm(value: f64) -> Self {
        Self { nm: value }
    }

    pub fn m(value: f64) -> Self {
        Self {
            nm: value / METERS_PER_NM,
        }
    }

    pub fn as_nm(&self) -> f64 {
        self.nm
    }

    pub fn as_m(&self) -> f64 {
        self.nm * METERS_PER_NM
    }
}

impl Add for Length {
    type Output = Length;

    fn add(self, rhs: Self) -> Self::Output {
        Length::nm(self.nm + rhs.nm)
    }
}

impl Sub for Length {
    type Output = Length;

    fn sub(self, rhs: Self) -> Self::Output {
        Length::nm(self.nm - rhs.nm)
    }
}

impl Div<Speed> for Length {
    type Output = Duration;

    /// Time to cover the length at the given speed.
    fn div(self, rhs: Speed) -> Self::Output {
        Duration::min(60.0 * self.nm / rhs.kt.max(1.0))
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} NM", self.nm)
    }
}

/// A speed stored in knots.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Default, Serialize, Deserialize)]
pub struct Speed {
    kt: f64,
}

impl Speed {
    pub fn kt(value: f64) -> Self {
        Self { kt: value }
    }

    pub fn as_kt(&self) -> f64 {
        self.kt
    }
}

impl Mul<f64> for Speed {
    type Output = Speed;

    fn mul(self, rhs: f64) -> Self::Output {
        Speed::kt(self.kt * rhs)
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0} kt", self.kt)
    }
}

/// A duration stored in minutes.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Default, Serialize, Deserialize)]
pub struct Duration {
    minutes: f64,
}

impl Duration {
    pub fn min(value: f64) -> Self {
        Self { minutes: value }
    }

    pub fn as_min(&self) -> f64 {
        self.minutes
    }

    pub fn as_hours(&self) -> f64 {
        self.minutes / 60.0
    }
}

impl Add for Duration {
    type Output = Duration;

    fn add(self, rhs: Self) -> Self::Output {
        Duration::min(self.minutes + rhs.minutes)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = (self.minutes / 60.0).floor();
        let m = self.minutes - h * 60.0;
        write!(f, "{h:.0}:{m:02.0}")
    }
}
