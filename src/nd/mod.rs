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

//! Navigation Data.
//!
//! [`NavigationData`] holds the merged entity stores; it is owned exclusively
//! by the [repository] and read through the borrowed [`Query`] view. Route
//! plans copy what they need out of the stores, so plans survive reloads.
//!
//! [repository]: crate::store::Repository

use std::collections::HashMap;
use std::rc::Rc;

use geo::Point;
use serde::{Deserialize, Serialize};

mod airport;
mod airway;
mod fix;
mod mora;
mod navaid;
mod procedure;
mod query;
mod runway;
pub mod spatial;
mod waypoint;

pub use airport::{Airport, AirportType};
pub use airway::Airway;
pub use fix::Fix;
pub use mora::{MoraCell, MoraSource};
pub use navaid::{Navaid, NavaidType};
pub use procedure::{Procedure, ProcedureKind, Transition};
pub use query::{Query, QueryIndex, SearchContext, SearchHit, TokenTypes};
pub use runway::{AirspaceClass, Frequency, Runway};
pub use spatial::{Bounds, CellGrid};
pub use waypoint::{Waypoint, WaypointKind};

/// Anything with an identifier and a position.
pub trait NavPoint {
    fn ident(&self) -> &str;
    fn point(&self) -> Point<f64>;
}

/// The canonical kind the token-type index records for an identifier.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum TokenKind {
    Airport,
    Navaid,
    Fix,
    Airway,
    Procedure,
}

/// Tag of the data source an entity or snapshot part came from.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum SourceTag {
    /// The authoritative aviation source.
    Nasr,
    /// The fallback source filling identifiers the authoritative one lacks.
    OurAirports,
    /// The MORA grid source.
    Mora,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nasr => "nasr",
            Self::OurAirports => "ourairports",
            Self::Mora => "mora",
        }
    }
}

/// Per-store record counts.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct EntityCounts {
    pub airports: usize,
    pub navaids: usize,
    pub fixes: usize,
    pub airways: usize,
    pub procedures: usize,
    pub frequencies: usize,
    pub runways: usize,
    pub airspaces: usize,
    pub mora_cells: usize,
}

/// The merged entity stores.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct NavigationData {
    pub(crate) airports: HashMap<String, Rc<Airport>>,
    pub(crate) navaids: HashMap<String, Rc<Navaid>>,
    pub(crate) fixes: HashMap<String, Rc<Fix>>,
    pub(crate) airways: HashMap<String, Rc<Airway>>,
    /// Procedures are reachable under both their name and computer code.
    pub(crate) procedures: HashMap<String, Rc<Procedure>>,
    pub(crate) frequencies: HashMap<String, Vec<Frequency>>,
    pub(crate) runways: HashMap<String, Vec<Runway>>,
    pub(crate) airspaces: HashMap<String, AirspaceClass>,
    /// IATA → ICAO secondary lookup; never part of the token-type index.
    pub(crate) iata: HashMap<String, String>,
    pub(crate) mora: HashMap<(i16, i16), MoraCell>,
}

impl NavigationData {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no aviation entities are loaded (MORA alone does not count).
    pub fn is_empty(&self) -> bool {
        self.airports.is_empty() && self.navaids.is_empty() && self.fixes.is_empty()
    }

    pub fn counts(&self) -> EntityCounts {
        EntityCounts {
            airports: self.airports.len(),
            navaids: self.navaids.len(),
            fixes: self.fixes.len(),
            airways: self.airways.len(),
            // name and computer code point at the same record
            procedures: self
                .procedures
                .iter()
                .filter(|(k, p)| **k == p.computer_code)
                .count(),
            frequencies: self.frequencies.values().map(Vec::len).sum(),
            runways: self.runways.values().map(Vec::len).sum(),
            airspaces: self.airspaces.len(),
            mora_cells: self.mora.len(),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Adds an airport unless the identifier is already claimed.
    pub(crate) fn add_airport(&mut self, arpt: Airport) -> bool {
        if self.airports.contains_key(&arpt.ident) {
            return false;
        }
        if let Some(iata) = &arpt.iata {
            self.iata
                .entry(iata.clone())
                .or_insert_with(|| arpt.ident.clone());
        }
        self.airports.insert(arpt.ident.clone(), Rc::new(arpt));
        true
    }

    pub(crate) fn add_navaid(&mut self, navaid: Navaid) -> bool {
        if self.navaids.contains_key(&navaid.ident) {
            return false;
        }
        self.navaids.insert(navaid.ident.clone(), Rc::new(navaid));
        true
    }

    pub(crate) fn add_fix(&mut self, fix: Fix) -> bool {
        if self.fixes.contains_key(&fix.ident) {
            return false;
        }
        self.fixes.insert(fix.ident.clone(), Rc::new(fix));
        true
    }

    pub(crate) fn add_airway(&mut self, airway: Airway) -> bool {
        if self.airways.contains_key(&airway.ident) {
            return false;
        }
        self.airways.insert(airway.ident.clone(), Rc::new(airway));
        true
    }

    /// Adds a procedure under both its name and computer code.
    pub(crate) fn add_procedure(&mut self, proc: Procedure) -> bool {
        if self.procedures.contains_key(&proc.computer_code) {
            return false;
        }
        let proc = Rc::new(proc);
        self.procedures
            .entry(proc.name.clone())
            .or_insert_with(|| Rc::clone(&proc));
        self.procedures
            .insert(proc.computer_code.clone(), Rc::clone(&proc));
        true
    }

    pub(crate) fn add_frequency(&mut self, airport: String, freq: Frequency) {
        self.frequencies.entry(airport).or_default().push(freq);
    }

    pub(crate) fn add_runway(&mut self, airport: String, rwy: Runway) {
        self.runways.entry(airport).or_default().push(rwy);
    }

    pub(crate) fn add_airspace(&mut self, airport: String, class: AirspaceClass) {
        self.airspaces.entry(airport).or_insert(class);
    }

    pub(crate) fn add_mora(&mut self, cell: MoraCell) {
        self.mora.insert(cell.key(), cell);
    }

    pub fn airport(&self, ident: &str) -> Option<Rc<Airport>> {
        self.airports.get(ident).map(Rc::clone)
    }

    pub fn navaid(&self, ident: &str) -> Option<Rc<Navaid>> {
        self.navaids.get(ident).map(Rc::clone)
    }

    pub fn fix(&self, ident: &str) -> Option<Rc<Fix>> {
        self.fixes.get(ident).map(Rc::clone)
    }

    pub fn airway(&self, ident: &str) -> Option<Rc<Airway>> {
        self.airways.get(ident).map(Rc::clone)
    }

    pub fn procedure(&self, key: &str) -> Option<Rc<Procedure>> {
        self.procedures.get(key).map(Rc::clone)
    }

    pub fn frequencies(&self, airport: &str) -> &[Frequency] {
        self.frequencies
            .get(airport)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn runways(&self, airport: &str) -> &[Runway] {
        self.runways.get(airport).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn airspace(&self, airport: &str) -> Option<&AirspaceClass> {
        self.airspaces.get(airport)
    }

    pub fn iata_to_icao(&self, iata: &str) -> Option<&str> {
        self.iata.get(iata).map(String::as_str)
    }

    pub fn mora_cell(&self, key: (i16, i16)) -> Option<&MoraCell> {
        self.mora.get(&key)
    }

    pub(crate) fn mora_cells(&self) -> &HashMap<(i16, i16), MoraCell> {
        &self.mora
    }
}
