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

//! Offline flight-planning engine.
//!
//! The engine takes an ICAO-style route string like
//! `KJFK RBV Q430 AIR CLPRR3 KCMH` together with cruise parameters, resolves
//! it against an aviation database, expands airways and procedures into a
//! waypoint sequence, computes per-leg navigation (distance, courses,
//! wind-corrected heading, ground speed, time, fuel) and checks the planned
//! altitude against minimum off-route altitudes along the way.
//!
//! Three subsystems collaborate, with dependencies flowing strictly
//! downward:
//!
//! - the [route pipeline](route): Lexer → Parser → Resolver → Expander →
//!   Calculator, non-fatal by design — diagnostics accumulate and the plan
//!   is always produced;
//! - the [data repository](store): two aviation sources (authoritative +
//!   fallback) and the MORA grid, merged into typed stores, persisted as a
//!   checksummed snapshot with raw-source retention for reindexing;
//! - the [terrain analyzer](terrain): 1°×1° MORA grid with route sampling
//!   and clearance verdicts.
//!
//! [`FMS`](fms::FMS) ties them together:
//!
//! ```no_run
//! use navplan::prelude::*;
//!
//! # async fn run() -> Result<(), navplan::Error> {
//! let cache = Cache::open("navplan.db")?;
//! let mut fms = FMS::new(Repository::new(cache, SourceSet::default()));
//!
//! let client = FetchClient::new()?;
//! fms.load(&client, &mut |progress| println!("{progress:?}")).await?;
//!
//! let plan = fms.plan("KJFK RBV Q430 AIR CLPRR3 KCMH", &PlanOptions::default())?;
//! for leg in &plan.legs {
//!     println!("{} -> {}: {} {}", leg.from.ident, leg.to.ident, leg.dist, leg.mc);
//! }
//! # Ok(())
//! # }
//! ```

pub mod diag;
pub mod error;
pub mod fc;
pub mod fms;
pub mod geomag;
pub mod measurements;
pub mod nd;
pub mod route;
pub mod store;
pub mod terrain;
pub mod wind;

pub use error::{Error, Result};

/// The commonly needed types in one import.
pub mod prelude {
    pub use crate::diag::{Code, Diagnostic, Stage};
    pub use crate::error::{Error, Result};
    pub use crate::fms::FMS;
    pub use crate::geomag::{FixedVariation, MagneticModel, Wmm};
    pub use crate::measurements::{Angle, Duration, Length, Speed};
    pub use crate::nd::{
        Airport, Airway, Bounds, Fix, NavigationData, Navaid, Procedure, Query, SearchContext,
        TokenKind, Waypoint, WaypointKind,
    };
    pub use crate::route::{FuelPlan, Leg, PlanOptions, Reserve, RoutePlan, Totals};
    pub use crate::store::{
        Cache, DataSource, FetchClient, LoadProgress, Repository, SourceSet,
    };
    pub use crate::terrain::{Clearance, TerrainAnalyzer, TerrainReport};
    pub use crate::wind::{ConstantWind, ForecastPeriod, Wind, WindProvider};
}
