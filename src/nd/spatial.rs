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

//! Uniform 1°×1° spatial bucketing.
//!
//! Both the spatial query index and the MORA grid key cells by the floor of
//! latitude and longitude; the cell at `(i, j)` covers `[i, i+1) × [j, j+1)`.

use std::collections::HashMap;

use geo::Point;

/// The SW-corner key of the cell containing a position.
pub fn cell_key(lat: f64, lon: f64) -> (i16, i16) {
    (lat.floor() as i16, lon.floor() as i16)
}

/// An axis-aligned geographic box.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Bounds {
    pub fn contains(&self, point: Point<f64>) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.y())
            && (self.min_lon..=self.max_lon).contains(&point.x())
    }

    /// Cell keys whose 1° cell intersects the bounds.
    pub fn cell_keys(&self) -> impl Iterator<Item = (i16, i16)> {
        let lat0 = self.min_lat.floor() as i16;
        let lat1 = self.max_lat.floor() as i16;
        let lon0 = self.min_lon.floor() as i16;
        let lon1 = self.max_lon.floor() as i16;
        (lat0..=lat1).flat_map(move |lat| (lon0..=lon1).map(move |lon| (lat, lon)))
    }
}

/// A bucket map over 1° cells.
#[derive(Clone, Debug, Default)]
pub struct CellGrid<T> {
    cells: HashMap<(i16, i16), Vec<T>>,
}

impl<T> CellGrid<T> {
    pub fn new() -> Self {
        Self {
            cells: HashMap::new(),
        }
    }

    pub fn insert(&mut self, lat: f64, lon: f64, item: T) {
        self.cells.entry(cell_key(lat, lon)).or_default().push(item);
    }

    pub fn cell(&self, key: (i16, i16)) -> &[T] {
        self.cells.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Items in all cells intersecting the bounds. Coarse: callers filter by
    /// exact position afterwards.
    pub fn in_bounds<'a>(&'a self, bounds: &Bounds) -> impl Iterator<Item = &'a T> + 'a {
        bounds
            .cell_keys()
            .collect::<Vec<_>>()
            .into_iter()
            .flat_map(move |key| self.cell(key).iter())
    }

    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
