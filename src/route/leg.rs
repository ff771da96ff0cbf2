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

//! Leg calculator.
//!
//! For each adjacent waypoint pair: Vincenty distance and true course,
//! magnetic course from the magnetic model, wind-corrected heading and
//! ground speed, time and fuel. A leg that cannot be fully computed is
//! still emitted with whatever fields are computable and a `calc_error`
//! marker; the plan never aborts over a single leg.

use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};

use super::PlanOptions;
use crate::diag::{Code, Diagnostic};
use crate::fc;
use crate::geomag::MagneticModel;
use crate::measurements::{Angle, Duration, Length, Speed};
use crate::nd::Waypoint;
use crate::wind::{Wind, WindProvider, WindsAloft};

/// A leg from one waypoint to the next.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Leg {
    pub from: Waypoint,
    pub to: Waypoint,
    pub dist: Length,
    /// True course at the start of the leg.
    pub tc: Angle,
    /// Magnetic course: true course minus the variation at the start.
    pub mc: Angle,
    /// True heading considering the wind correction angle.
    pub th: Option<Angle>,
    /// Magnetic heading.
    pub mh: Option<Angle>,
    pub wca: Option<Angle>,
    pub gs: Option<Speed>,
    pub ete: Option<Duration>,
    pub fuel_gal: Option<f64>,
    pub wind: Option<Wind>,
    /// Wind vectors at the filed altitude and ±1000, ±2000 ft.
    pub winds_aloft: Option<WindsAloft>,
    /// Distance and course came from the haversine fallback.
    pub approximate: bool,
    pub calc_error: bool,
}

/// Computes all legs for the expanded waypoint sequence.
pub fn build_legs(
    waypoints: &[Waypoint],
    options: &PlanOptions,
    winds: &dyn WindProvider,
    magnetic: &dyn MagneticModel,
    date: NaiveDate,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Leg> {
    waypoints
        .windows(2)
        .map(|pair| build_leg(&pair[0], &pair[1], options, winds, magnetic, date, diagnostics))
        .collect()
}

fn build_leg(
    from: &Waypoint,
    to: &Waypoint,
    options: &PlanOptions,
    winds: &dyn WindProvider,
    magnetic: &dyn MagneticModel,
    date: NaiveDate,
    diagnostics: &mut Vec<Diagnostic>,
) -> Leg {
    let inverse = fc::inverse(from.point, to.point);
    if !inverse.converged {
        diagnostics.push(Diagnostic::calc(
            Code::NonConvergence,
            format!(
                "Vincenty did not converge for {} → {}, using spherical approximation",
                from.ident, to.ident
            ),
        ));
    }

    let tc = inverse.bearing;
    let variation = magnetic
        .variation(from.point, options.cruise_altitude_ft, date)
        .unwrap_or(0.0);
    let mc = Angle::deg(tc.degrees() - variation);

    let tas = Speed::kt(options.cruise_tas_kt);
    let mut calc_error = false;

    let (wind, wca, gs, th, winds_aloft) = if options.wind_correction {
        let midpoint = fc::intermediate_point(from.point, to.point, 0.5);
        let wind = winds.wind_at(midpoint, options.cruise_altitude_ft, options.forecast_period);
        let winds_aloft = Some(WindsAloft::sample(
            winds,
            midpoint,
            options.cruise_altitude_ft,
            options.forecast_period,
        ));

        match wind {
            Some(wind) => match fc::wind_correction_angle(&wind, tas, tc) {
                Some(wca_deg) => {
                    let gs_raw = fc::ground_speed(tas, &wind, wca_deg, tc);
                    if gs_raw < 1.0 {
                        warn!(
                            "wind on {} → {} leaves no positive ground speed",
                            from.ident, to.ident
                        );
                        diagnostics.push(Diagnostic::calc(
                            Code::GroundSpeed,
                            format!(
                                "cannot make good the course {} → {} against the wind",
                                from.ident, to.ident
                            ),
                        ));
                        calc_error = true;
                    }
                    let th = Angle::deg(tc.degrees() + wca_deg);
                    (
                        Some(wind),
                        Some(Angle::deg(wca_deg)),
                        Some(Speed::kt(gs_raw.max(1.0))),
                        Some(th),
                        winds_aloft,
                    )
                }
                None => {
                    diagnostics.push(Diagnostic::calc(
                        Code::GroundSpeed,
                        format!(
                            "wind exceeds airspeed on {} → {}, no correction possible",
                            from.ident, to.ident
                        ),
                    ));
                    calc_error = true;
                    (Some(wind), None, None, None, winds_aloft)
                }
            },
            // no forecast for the point: plan with still air
            None => (None, None, Some(tas), None, winds_aloft),
        }
    } else {
        (None, None, Some(tas), None, None)
    };

    let mh = th.map(|th| Angle::deg(th.degrees() - variation));
    let ete = gs.map(|gs| inverse.distance / gs);
    let fuel_gal = match (options.fuel_plan, ete) {
        (true, Some(ete)) => Some(ete.as_hours() * options.burn_rate_gph),
        _ => None,
    };

    Leg {
        from: from.clone(),
        to: to.clone(),
        dist: inverse.distance,
        tc,
        mc,
        th,
        mh,
        wca,
        gs,
        ete,
        fuel_gal,
        wind,
        winds_aloft,
        approximate: !inverse.converged,
        calc_error,
    }
}
