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

//! Flight Computer.
//!
//! Geodesy and wind-triangle arithmetic on WGS-84. Distances and courses use
//! the Vincenty inverse formula; pairs for which the iteration does not
//! converge (near-antipodal points) fall back to a spherical haversine and
//! are flagged so the caller can mark the leg as approximate.
//!
//! Points follow the `geo` convention: `x` is longitude, `y` is latitude.

use geo::Point;

use crate::measurements::{Angle, Length, Speed};
use crate::wind::Wind;

/// WGS-84 semi-major axis in meters.
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS-84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// Spherical earth radius used by the haversine fallback.
pub const EARTH_RADIUS_NM: f64 = 3_440.065;

const VINCENTY_EPS: f64 = 1e-12;
const VINCENTY_MAX_ITER: usize = 200;

/// Result of an inverse geodesic computation.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Inverse {
    pub distance: Length,
    /// Initial great-circle bearing at the start point, `[0, 360)`.
    pub bearing: Angle,
    /// False when the haversine fallback produced the values.
    pub converged: bool,
}

/// Distance and initial bearing between two points.
///
/// Tries Vincenty first and falls back to haversine when the iteration does
/// not converge.
pub fn inverse(from: Point<f64>, to: Point<f64>) -> Inverse {
    match vincenty_inverse(from, to) {
        Some(inv) => inv,
        None => {
            let (distance, bearing) = haversine(from, to);
            Inverse {
                distance,
                bearing,
                converged: false,
            }
        }
    }
}

/// Vincenty inverse formula on the WGS-84 ellipsoid.
///
/// Returns `None` if the λ-iteration does not converge to within 1e-12 rad.
pub fn vincenty_inverse(from: Point<f64>, to: Point<f64>) -> Option<Inverse> {
    let (lat1, lon1) = (from.y().to_radians(), from.x().to_radians());
    let (lat2, lon2) = (to.y().to_radians(), to.x().to_radians());

    let a = WGS84_A;
    let f = WGS84_F;
    let b = a * (1.0 - f);

    let l = lon2 - lon1;
    let u1 = ((1.0 - f) * lat1.tan()).atan();
    let u2 = ((1.0 - f) * lat2.tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    let mut iter = 0;

    let (sin_sigma, cos_sigma, sigma, cos_sq_alpha, cos_2sigma_m) = loop {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();

        let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
        .sqrt();
        if sin_sigma == 0.0 {
            // coincident points
            return Some(Inverse {
                distance: Length::nm(0.0),
                bearing: Angle::deg(0.0),
                converged: true,
            });
        }

        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        let sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        let cos_2sigma_m = if cos_sq_alpha == 0.0 {
            // equatorial line
            0.0
        } else {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        };

        let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
        let lambda_prev = lambda;
        lambda = l
            + (1.0 - c)
                * f
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m
                            + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

        if (lambda - lambda_prev).abs() < VINCENTY_EPS {
            break (sin_sigma, cos_sigma, sigma, cos_sq_alpha, cos_2sigma_m);
        }

        iter += 1;
        if iter >= VINCENTY_MAX_ITER {
            return None;
        }
    };

    let u_sq = cos_sq_alpha * (a * a - b * b) / (b * b);
    let aa = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let bb = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
    let delta_sigma = bb
        * sin_sigma
        * (cos_2sigma_m
            + bb / 4.0
                * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)
                    - bb / 6.0
                        * cos_2sigma_m
                        * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                        * (-3.0 + 4.0 * cos_2sigma_m * cos_2sigma_m)));

    let distance_m = b * aa * (sigma - delta_sigma);

    let (sin_lambda, cos_lambda) = lambda.sin_cos();
    let bearing = (cos_u2 * sin_lambda)
        .atan2(cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda)
        .to_degrees();

    Some(Inverse {
        distance: Length::m(distance_m),
        bearing: Angle::deg(bearing),
        converged: true,
    })
}

/// Spherical haversine distance and initial bearing.
pub fn haversine(from: Point<f64>, to: Point<f64>) -> (Length, Angle) {
    let (lat1, lon1) = (from.y().to_radians(), from.x().to_radians());
    let (lat2, lon2) = (to.y().to_radians(), to.x().to_radians());

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let distance = 2.0 * h.sqrt().asin() * EARTH_RADIUS_NM;

    let bearing = (dlon.sin() * lat2.cos())
        .atan2(lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos())
        .to_degrees();

    (Length::nm(distance), Angle::deg(bearing))
}

/// Point at `fraction` of the great circle from `from` to `to`.
///
/// Spherical interpolation; used for terrain sampling where sub-NM accuracy
/// is irrelevant.
pub fn intermediate_point(from: Point<f64>, to: Point<f64>, fraction: f64) -> Point<f64> {
    let (lat1, lon1) = (from.y().to_radians(), from.x().to_radians());
    let (lat2, lon2) = (to.y().to_radians(), to.x().to_radians());

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let delta = 2.0 * h.sqrt().asin();

    if delta == 0.0 {
        return from;
    }

    let a = ((1.0 - fraction) * delta).sin() / delta.sin();
    let b = (fraction * delta).sin() / delta.sin();

    let x = a * lat1.cos() * lon1.cos() + b * lat2.cos() * lon2.cos();
    let y = a * lat1.cos() * lon1.sin() + b * lat2.cos() * lon2.sin();
    let z = a * lat1.sin() + b * lat2.sin();

    let lat = z.atan2((x * x + y * y).sqrt());
    let lon = y.atan2(x);

    Point::new(lon.to_degrees(), lat.to_degrees())
}

/// Converts an angle from degree minutes and seconds to decimal.
pub fn dms_to_decimal(degree: u16, minutes: u8, seconds: u8) -> f64 {
    degree as f64 + minutes as f64 / 60.0 + seconds as f64 / 3600.0
}

/// Wind correction angle for a desired true course.
///
/// The law of sines gives `sin(wca) / w = sin(wind_dir − tc) / tas`. Returns
/// `None` when the wind is stronger than the aircraft can correct for
/// (asin argument outside `[-1, 1]`).
pub fn wind_correction_angle(wind: &Wind, tas: Speed, tc: Angle) -> Option<f64> {
    let wind_angle = (wind.direction.degrees() - tc.degrees()).to_radians();
    let ratio = wind.speed.as_kt() / tas.as_kt() * wind_angle.sin();
    if !(-1.0..=1.0).contains(&ratio) {
        return None;
    }
    Some(ratio.asin().to_degrees())
}

/// Ground speed from the closed-form wind triangle.
///
/// `GS = TAS·cos(WCA) − W·cos(wind_dir − TC)`. May be non-positive in winds
/// exceeding the TAS; the caller decides how to clamp and diagnose.
pub fn ground_speed(tas: Speed, wind: &Wind, wca_deg: f64, tc: Angle) -> f64 {
    let wind_angle = (wind.direction.degrees() - tc.degrees()).to_radians();
    tas.as_kt() * wca_deg.to_radians().cos() - wind.speed.as_kt() * wind_angle.cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Published airport reference points used as the benchmark pairs.
    fn kjfk() -> Point<f64> {
        Point::new(-73.778925, 40.639751)
    }

    fn kord() -> Point<f64> {
        Point::new(-87.904842, 41.978603)
    }

    #[test]
    fn vincenty_jfk_to_ord() {
        let inv = vincenty_inverse(kjfk(), kord()).expect("should converge");
        // Great-circle distance JFK-ORD is about 639 NM.
        assert!(
            (inv.distance.as_nm() - 638.9).abs() < 1.0,
            "got {:.2} NM",
            inv.distance.as_nm()
        );
        // Initial course is roughly west-northwest.
        assert!((280.0..300.0).contains(&inv.bearing.degrees()));
    }

    #[test]
    fn vincenty_is_symmetric() {
        let ab = vincenty_inverse(kjfk(), kord()).unwrap();
        let ba = vincenty_inverse(kord(), kjfk()).unwrap();
        assert!((ab.distance.as_nm() - ba.distance.as_nm()).abs() < 1e-9);
    }

    #[test]
    fn coincident_points_are_zero() {
        let inv = vincenty_inverse(kjfk(), kjfk()).unwrap();
        assert_eq!(inv.distance.as_nm(), 0.0);
    }

    #[test]
    fn antipodal_falls_back_to_haversine() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(179.7, 0.3);
        let inv = inverse(a, b);
        assert!(!inv.converged);
        // Half the spherical circumference is ~10800 NM.
        assert!((inv.distance.as_nm() - 10_800.0).abs() < 200.0);
    }

    #[test]
    fn haversine_one_degree_meridian() {
        let (dist, bearing) = haversine(Point::new(0.0, 0.0), Point::new(0.0, 1.0));
        // One degree of latitude on the sphere is 60 NM by construction.
        assert!((dist.as_nm() - 60.04).abs() < 0.1);
        assert_eq!(bearing.degrees().round(), 0.0);
    }

    #[test]
    fn intermediate_point_midway() {
        let mid = intermediate_point(Point::new(0.0, 0.0), Point::new(0.0, 10.0), 0.5);
        assert!((mid.y() - 5.0).abs() < 1e-9);
        assert!(mid.x().abs() < 1e-9);
    }

    #[test]
    fn crosswind_correction_left_and_right() {
        // Flying east (090) with wind from the south (180) pushes the
        // aircraft north; the correction turns into the wind.
        let wind = Wind::new(Angle::deg(180.0), Speed::kt(50.0));
        let wca = wind_correction_angle(&wind, Speed::kt(100.0), Angle::deg(90.0)).unwrap();
        assert_eq!(wca.round(), 30.0);

        let wind = Wind::new(Angle::deg(0.0), Speed::kt(50.0));
        let wca = wind_correction_angle(&wind, Speed::kt(100.0), Angle::deg(90.0)).unwrap();
        assert_eq!(wca.round(), -30.0);
    }

    #[test]
    fn headwind_reduces_ground_speed() {
        let wind = Wind::new(Angle::deg(0.0), Speed::kt(20.0));
        let gs = ground_speed(Speed::kt(100.0), &wind, 0.0, Angle::deg(0.0));
        assert_eq!(gs.round(), 80.0);
    }

    #[test]
    fn tailwind_increases_ground_speed() {
        let wind = Wind::new(Angle::deg(180.0), Speed::kt(20.0));
        let gs = ground_speed(Speed::kt(100.0), &wind, 0.0, Angle::deg(0.0));
        assert_eq!(gs.round(), 120.0);
    }

    #[test]
    fn dms() {
        assert_eq!(dms_to_decimal(40, 30, 0), 40.5);
    }
}
