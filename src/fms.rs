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

//! Flight Management System.
//!
//! [`FMS`] owns the systems that depend on one another: the data
//! repository, the magnetic model, the wind provider and the terrain
//! analyzer. A planning request runs the route pipeline against the
//! repository's query view, attaches the terrain analysis and clearance
//! verdict, and returns the plan with every accumulated diagnostic.

use chrono::{NaiveDate, Utc};
use log::{debug, info};

use crate::error::{Error, Result};
use crate::geomag::{MagneticModel, Wmm};
use crate::route::{self, PlanOptions, RoutePlan};
use crate::store::{FetchClient, LoadProgress, Repository};
use crate::terrain::{TerrainAnalyzer, TerrainReport};
use crate::wind::{CalmWinds, WindProvider};

/// The orchestrating service of the planning engine.
pub struct FMS {
    repository: Repository,
    magnetic: Box<dyn MagneticModel>,
    winds: Box<dyn WindProvider>,
}

impl FMS {
    /// Constructs an FMS over a repository, with the World Magnetic Model
    /// and still air.
    pub fn new(repository: Repository) -> Self {
        Self {
            repository,
            magnetic: Box::new(Wmm),
            winds: Box::new(CalmWinds),
        }
    }

    pub fn with_magnetic(mut self, magnetic: impl MagneticModel + 'static) -> Self {
        self.magnetic = Box::new(magnetic);
        self
    }

    pub fn with_winds(mut self, winds: impl WindProvider + 'static) -> Self {
        self.winds = Box::new(winds);
        self
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn repository_mut(&mut self) -> &mut Repository {
        &mut self.repository
    }

    /// Loads the repository (cache first, then the network sources).
    pub async fn load(
        &mut self,
        client: &FetchClient,
        progress: &mut dyn FnMut(LoadProgress),
    ) -> Result<()> {
        self.repository.load(client, progress).await
    }

    /// Plans a route for today.
    pub fn plan(&self, route: &str, options: &PlanOptions) -> Result<RoutePlan> {
        self.plan_on(route, options, Utc::now().date_naive())
    }

    /// Plans a route for a specific date (the date feeds the magnetic
    /// model).
    pub fn plan_on(
        &self,
        route: &str,
        options: &PlanOptions,
        date: NaiveDate,
    ) -> Result<RoutePlan> {
        // the wind triangle feeds the fuel numbers; fuel planning without it
        // would report endurance the aircraft cannot fly
        if options.fuel_plan && !options.wind_correction {
            return Err(Error::InconsistentOptions(
                "fuel planning requires wind correction".to_string(),
            ));
        }

        debug!("planning {route:?} at {} ft", options.cruise_altitude_ft);
        let q = self.repository.query();
        let mut plan = route::plan(
            route,
            &q,
            options,
            self.winds.as_ref(),
            self.magnetic.as_ref(),
            date,
        );

        let analyzer = TerrainAnalyzer::new(self.repository.nd().mora_cells());
        let analysis = analyzer.analyze_route(&plan.waypoints);
        let clearance = analyzer.check_clearance(options.cruise_altitude_ft, &analysis);
        plan.terrain = Some(TerrainReport {
            analysis,
            clearance,
        });

        info!(
            "plan ready: {} legs, {:.1} NM, {} diagnostics",
            plan.legs.len(),
            plan.totals.dist.as_nm(),
            plan.diagnostics.len()
        );
        Ok(plan)
    }
}
