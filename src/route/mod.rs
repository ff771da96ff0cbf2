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

//! The route pipeline.
//!
//! Lexer → Parser → Resolver → Expander → Calculator. No stage aborts the
//! plan: each runs best-effort on what the previous one produced, and the
//! accumulated diagnostics travel with the returned [`RoutePlan`].

use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::diag::Diagnostic;
use crate::geomag::MagneticModel;
use crate::measurements::{Duration, Length};
use crate::nd::{Query, Waypoint};
use crate::terrain::TerrainReport;
use crate::wind::{ForecastPeriod, WindProvider};

pub mod expander;
pub mod lexer;
pub mod parser;
pub mod resolver;

mod leg;

pub use leg::Leg;
pub use lexer::{lex, Token};
pub use parser::ParseNode;
pub use resolver::ResolvedNode;

/// VFR fuel reserve policy.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum Reserve {
    #[default]
    Min30,
    Min45,
    Min60,
}

impl Reserve {
    pub fn minutes(&self) -> f64 {
        match self {
            Self::Min30 => 30.0,
            Self::Min45 => 45.0,
            Self::Min60 => 60.0,
        }
    }
}

/// Planning options for one request.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct PlanOptions {
    pub cruise_tas_kt: f64,
    /// Filed altitude; also drives winds sampling and the clearance check.
    pub cruise_altitude_ft: f64,
    pub wind_correction: bool,
    pub forecast_period: ForecastPeriod,
    pub fuel_plan: bool,
    pub usable_fuel_gal: f64,
    pub taxi_fuel_gal: f64,
    pub burn_rate_gph: f64,
    pub vfr_reserve: Reserve,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            cruise_tas_kt: 120.0,
            cruise_altitude_ft: 6500.0,
            wind_correction: true,
            forecast_period: ForecastPeriod::default(),
            fuel_plan: false,
            usable_fuel_gal: 0.0,
            taxi_fuel_gal: 0.0,
            burn_rate_gph: 0.0,
            vfr_reserve: Reserve::default(),
        }
    }
}

/// Whole-route totals.
#[derive(Copy, Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Totals {
    pub dist: Length,
    pub ete: Duration,
    pub fuel_gal: Option<f64>,
}

/// Fuel-on-board tracking across the route.
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct FuelPlan {
    /// Usable fuel minus taxi fuel.
    pub start_fob_gal: f64,
    pub burn_gal: f64,
    pub final_fob_gal: f64,
    pub reserve_gal: f64,
    /// Final fuel on board minus the reserve is negative.
    pub insufficient: bool,
}

/// The product of one planning request.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct RoutePlan {
    /// The original route string.
    pub route: String,
    pub waypoints: Vec<Waypoint>,
    pub legs: Vec<Leg>,
    pub totals: Totals,
    pub fuel: Option<FuelPlan>,
    pub terrain: Option<TerrainReport>,
    pub options: PlanOptions,
    pub diagnostics: Vec<Diagnostic>,
}

/// Runs the five pipeline stages for a route string.
///
/// Terrain analysis is attached by the FMS, which owns the MORA grid.
pub fn plan(
    route: &str,
    q: &Query<'_>,
    options: &PlanOptions,
    winds: &dyn WindProvider,
    magnetic: &dyn MagneticModel,
    date: NaiveDate,
) -> RoutePlan {
    debug!("planning route {route:?}");
    let mut diagnostics = Vec::new();

    let tokens = lexer::lex(route);

    let (nodes, parse_diagnostics) = parser::parse(&tokens, Some(q));
    diagnostics.extend(parse_diagnostics);

    let (resolved, resolve_diagnostics) = resolver::resolve(&nodes, q);
    diagnostics.extend(resolve_diagnostics);

    let (waypoints, expand_diagnostics) = expander::expand(&resolved, q);
    diagnostics.extend(expand_diagnostics);

    let legs = leg::build_legs(&waypoints, options, winds, magnetic, date, &mut diagnostics);

    let totals = totals(&legs, options.fuel_plan);
    let fuel = options.fuel_plan.then(|| fuel_plan(&legs, options));

    debug!(
        "route planned: {} waypoints, {} legs, {:.1} NM, {} diagnostics",
        waypoints.len(),
        legs.len(),
        totals.dist.as_nm(),
        diagnostics.len()
    );

    RoutePlan {
        route: route.to_string(),
        waypoints,
        legs,
        totals,
        fuel,
        terrain: None,
        options: options.clone(),
        diagnostics,
    }
}

fn totals(legs: &[Leg], fuel_plan: bool) -> Totals {
    let dist = legs
        .iter()
        .fold(Length::nm(0.0), |acc, leg| acc + leg.dist);
    let ete = legs
        .iter()
        .filter_map(|leg| leg.ete)
        .fold(Duration::min(0.0), |acc, ete| acc + ete);
    let fuel_gal = fuel_plan.then(|| legs.iter().filter_map(|leg| leg.fuel_gal).sum());

    Totals {
        dist,
        ete,
        fuel_gal,
    }
}

/// Cumulative final-on-board tracking from `usable − taxi` down each leg.
fn fuel_plan(legs: &[Leg], options: &PlanOptions) -> FuelPlan {
    let start_fob_gal = options.usable_fuel_gal - options.taxi_fuel_gal;
    let burn_gal: f64 = legs.iter().filter_map(|leg| leg.fuel_gal).sum();
    let final_fob_gal = start_fob_gal - burn_gal;
    let reserve_gal = options.vfr_reserve.minutes() / 60.0 * options.burn_rate_gph;

    FuelPlan {
        start_fob_gal,
        burn_gal,
        final_fob_gal,
        reserve_gal,
        insufficient: final_fob_gal - reserve_gal < 0.0,
    }
}
