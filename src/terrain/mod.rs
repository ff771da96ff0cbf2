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

//! Terrain analyzer.
//!
//! MORA-based clearance assessment over a 1°×1° global grid. Routes are
//! sampled every 5 NM along the great circles between waypoints; the grid
//! cells touched feed the whole-route statistics and the clearance verdict.

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::fc;
use crate::nd::spatial::{cell_key, Bounds};
use crate::nd::{MoraCell, MoraSource, NavPoint, Waypoint};

/// Sampling interval along the route.
pub const SAMPLE_INTERVAL_NM: f64 = 5.0;
/// Obstacle clearance buffer already embedded in every MORA value.
pub const CLEARANCE_BUFFER_FT: f64 = 1000.0;
/// Estimated terrain at or above this value makes a route mountainous.
pub const MOUNTAINOUS_TERRAIN_FT: f64 = 5000.0;

/// One distinct cell crossed by the route, with the cumulative distances of
/// its first and last crossing for display.
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct CellCrossing {
    pub cell: (i16, i16),
    pub mora_ft: f64,
    pub source: MoraSource,
    pub first_nm: f64,
    pub last_nm: f64,
}

/// Whole-route MORA statistics.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct RouteTerrainAnalysis {
    pub max_mora_ft: Option<f64>,
    pub min_mora_ft: Option<f64>,
    pub avg_mora_ft: Option<f64>,
    /// `max MORA − 1000 ft`; display only, never part of the verdict.
    pub estimated_terrain_ft: Option<f64>,
    pub mountainous: bool,
    pub required_clearance_ft: f64,
    pub samples: usize,
    pub cells: Vec<CellCrossing>,
}

/// Clearance verdict for a filed altitude.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum Clearance {
    Ok,
    Marginal,
    Unsafe,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ClearanceReport {
    pub verdict: Clearance,
    pub required_clearance_ft: f64,
    /// How far below the highest MORA the filed altitude sits (zero when at
    /// or above it).
    pub deficit_ft: f64,
}

/// Terrain analysis attached to a route plan.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct TerrainReport {
    pub analysis: RouteTerrainAnalysis,
    pub clearance: ClearanceReport,
}

/// Borrowed view over the repository's MORA cells.
pub struct TerrainAnalyzer<'a> {
    cells: &'a HashMap<(i16, i16), MoraCell>,
}

impl<'a> TerrainAnalyzer<'a> {
    pub fn new(cells: &'a HashMap<(i16, i16), MoraCell>) -> Self {
        Self { cells }
    }

    /// The cell covering a position, or absent when no data exists.
    pub fn mora_for(&self, lat: f64, lon: f64) -> Option<&MoraCell> {
        self.cells.get(&cell_key(lat, lon))
    }

    /// All cells intersecting the bounds. A full scan of the cell map; the
    /// global grid tops out around 64k cells.
    pub fn mora_in_bounds(&self, bounds: &Bounds) -> Vec<&MoraCell> {
        let mut cells: Vec<&MoraCell> = self
            .cells
            .values()
            .filter(|cell| {
                let (lat, lon) = (cell.lat as f64, cell.lon as f64);
                lat + 1.0 > bounds.min_lat
                    && lat <= bounds.max_lat
                    && lon + 1.0 > bounds.min_lon
                    && lon <= bounds.max_lon
            })
            .collect();
        cells.sort_by_key(|cell| cell.key());
        cells
    }

    /// Samples the route at 5 NM intervals and accumulates MORA statistics.
    ///
    /// Endpoints are included; the duplicate sample where one leg ends and
    /// the next begins is suppressed. Statistics only include cells with
    /// data.
    pub fn analyze_route(&self, waypoints: &[Waypoint]) -> RouteTerrainAnalysis {
        let mut analysis = RouteTerrainAnalysis::default();
        let mut crossings: HashMap<(i16, i16), CellCrossing> = HashMap::new();
        let mut sum = 0.0;
        let mut with_data = 0usize;
        let mut cumulative_nm = 0.0;

        for (leg_index, pair) in waypoints.windows(2).enumerate() {
            let (from, to) = (&pair[0], &pair[1]);
            let leg_nm = fc::inverse(from.point(), to.point()).distance.as_nm();

            let mut offset = 0.0;
            loop {
                let at_end = offset >= leg_nm;
                let sample_nm = if at_end { leg_nm } else { offset };

                // interior duplicate at the leg boundary
                let skip = leg_index > 0 && sample_nm == 0.0;
                if !skip {
                    let fraction = if leg_nm == 0.0 { 0.0 } else { sample_nm / leg_nm };
                    let point = fc::intermediate_point(from.point(), to.point(), fraction);
                    let total_nm = cumulative_nm + sample_nm;
                    analysis.samples += 1;

                    if let Some(cell) = self.mora_for(point.y(), point.x()) {
                        with_data += 1;
                        sum += cell.mora_ft;
                        crossings
                            .entry(cell.key())
                            .and_modify(|crossing| {
                                crossing.first_nm = crossing.first_nm.min(total_nm);
                                crossing.last_nm = crossing.last_nm.max(total_nm);
                            })
                            .or_insert(CellCrossing {
                                cell: cell.key(),
                                mora_ft: cell.mora_ft,
                                source: cell.source,
                                first_nm: total_nm,
                                last_nm: total_nm,
                            });
                        analysis.max_mora_ft = Some(
                            analysis
                                .max_mora_ft
                                .map_or(cell.mora_ft, |max: f64| max.max(cell.mora_ft)),
                        );
                        analysis.min_mora_ft = Some(
                            analysis
                                .min_mora_ft
                                .map_or(cell.mora_ft, |min: f64| min.min(cell.mora_ft)),
                        );
                    }
                }

                if at_end {
                    break;
                }
                offset += SAMPLE_INTERVAL_NM;
            }

            cumulative_nm += leg_nm;
        }

        if with_data > 0 {
            analysis.avg_mora_ft = Some(sum / with_data as f64);
        }
        analysis.estimated_terrain_ft = analysis.max_mora_ft.map(|max| max - CLEARANCE_BUFFER_FT);
        analysis.mountainous = analysis
            .estimated_terrain_ft
            .map(|terrain| terrain >= MOUNTAINOUS_TERRAIN_FT)
            .unwrap_or(false);
        analysis.required_clearance_ft = if analysis.mountainous { 2000.0 } else { 1000.0 };

        let mut cells: Vec<CellCrossing> = crossings.into_values().collect();
        cells.sort_by(|a, b| a.first_nm.total_cmp(&b.first_nm));
        analysis.cells = cells;

        debug!(
            "terrain analysis: {} samples, {} cells, max MORA {:?}",
            analysis.samples,
            analysis.cells.len(),
            analysis.max_mora_ft
        );
        analysis
    }

    /// Clearance verdict for a filed altitude against an analysis.
    ///
    /// UNSAFE below `max − required`, MARGINAL from there up to `max`, OK at
    /// or above the highest MORA. Raising the altitude can only improve the
    /// verdict.
    pub fn check_clearance(
        &self,
        altitude_ft: f64,
        analysis: &RouteTerrainAnalysis,
    ) -> ClearanceReport {
        let required_clearance_ft = analysis.required_clearance_ft;

        let Some(max_mora_ft) = analysis.max_mora_ft else {
            return ClearanceReport {
                verdict: Clearance::Ok,
                required_clearance_ft,
                deficit_ft: 0.0,
            };
        };

        let verdict = if altitude_ft >= max_mora_ft {
            Clearance::Ok
        } else if altitude_ft >= max_mora_ft - required_clearance_ft {
            Clearance::Marginal
        } else {
            Clearance::Unsafe
        };

        ClearanceReport {
            verdict,
            required_clearance_ft,
            deficit_ft: (max_mora_ft - altitude_ft).max(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use geo::Point;

    use super::*;
    use crate::nd::Waypoint;

    fn cells(entries: &[(i16, i16, f64)]) -> HashMap<(i16, i16), MoraCell> {
        entries
            .iter()
            .map(|&(lat, lon, mora_ft)| {
                (
                    (lat, lon),
                    MoraCell {
                        lat,
                        lon,
                        mora_ft,
                        source: MoraSource::Authoritative,
                    },
                )
            })
            .collect()
    }

    fn wp(ident: &str, lat: f64, lon: f64) -> Waypoint {
        Waypoint::gps(ident, Point::new(lon, lat))
    }

    #[test]
    fn mora_for_uses_the_sw_corner() {
        let cells = cells(&[(40, -75, 2800.0)]);
        let analyzer = TerrainAnalyzer::new(&cells);

        assert!(analyzer.mora_for(40.0, -75.0).is_some());
        assert!(analyzer.mora_for(40.999, -74.001).is_some());
        assert!(analyzer.mora_for(41.0, -75.0).is_none());
        assert!(analyzer.mora_for(39.999, -75.0).is_none());
    }

    #[test]
    fn empty_cell_lookup_is_absent_not_zero() {
        let cells = cells(&[]);
        let analyzer = TerrainAnalyzer::new(&cells);
        assert!(analyzer.mora_for(40.5, -74.5).is_none());
    }

    #[test]
    fn bounds_scan_returns_intersecting_cells() {
        let cells = cells(&[(40, -75, 2800.0), (40, -74, 2500.0), (45, -75, 9000.0)]);
        let analyzer = TerrainAnalyzer::new(&cells);

        let hits = analyzer.mora_in_bounds(&Bounds {
            min_lat: 40.2,
            max_lat: 40.8,
            min_lon: -74.9,
            max_lon: -73.9,
        });
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn analysis_accumulates_stats_over_touched_cells() {
        let cells = cells(&[(40, -75, 2800.0), (41, -75, 3400.0)]);
        let analyzer = TerrainAnalyzer::new(&cells);

        // a meridian route from 40.2°N to 41.8°N at 74.5°W, ~96 NM
        let analysis =
            analyzer.analyze_route(&[wp("A", 40.2, -74.5), wp("B", 41.8, -74.5)]);

        assert!(analysis.samples >= 20);
        assert_eq!(analysis.max_mora_ft, Some(3400.0));
        assert_eq!(analysis.min_mora_ft, Some(2800.0));
        assert_eq!(analysis.cells.len(), 2);
        // the cells are crossed in route order
        assert_eq!(analysis.cells[0].cell, (40, -75));
        assert!(analysis.cells[0].first_nm < analysis.cells[1].first_nm);
        assert!(!analysis.mountainous);
        assert_eq!(analysis.required_clearance_ft, 1000.0);
    }

    #[test]
    fn samples_without_data_do_not_skew_statistics() {
        // only the southern cell has data
        let cells = cells(&[(40, -75, 2800.0)]);
        let analyzer = TerrainAnalyzer::new(&cells);

        let analysis =
            analyzer.analyze_route(&[wp("A", 40.2, -74.5), wp("B", 41.8, -74.5)]);

        assert_eq!(analysis.avg_mora_ft, Some(2800.0));
        assert_eq!(analysis.cells.len(), 1);
    }

    #[test]
    fn high_mora_makes_a_route_mountainous_and_unsafe() {
        let cells = cells(&[(40, -75, 12_000.0)]);
        let analyzer = TerrainAnalyzer::new(&cells);

        let analysis =
            analyzer.analyze_route(&[wp("A", 40.2, -74.8), wp("B", 40.8, -74.2)]);
        assert_eq!(analysis.max_mora_ft, Some(12_000.0));
        assert!(analysis.mountainous);
        assert_eq!(analysis.required_clearance_ft, 2000.0);

        let report = analyzer.check_clearance(7000.0, &analysis);
        assert_eq!(report.verdict, Clearance::Unsafe);
        assert!(report.deficit_ft >= 5000.0);
    }

    #[test]
    fn clearance_improves_monotonically_with_altitude() {
        let cells = cells(&[(40, -75, 12_000.0)]);
        let analyzer = TerrainAnalyzer::new(&cells);
        let analysis =
            analyzer.analyze_route(&[wp("A", 40.2, -74.8), wp("B", 40.8, -74.2)]);

        let verdicts: Vec<Clearance> = (0..30)
            .map(|i| {
                analyzer
                    .check_clearance(6000.0 + i as f64 * 300.0, &analysis)
                    .verdict
            })
            .collect();

        // UNSAFE → MARGINAL → OK, never backwards
        let rank = |v: &Clearance| match v {
            Clearance::Unsafe => 0,
            Clearance::Marginal => 1,
            Clearance::Ok => 2,
        };
        assert!(verdicts.windows(2).all(|w| rank(&w[0]) <= rank(&w[1])));
        assert_eq!(verdicts.first().map(rank), Some(0));
        assert_eq!(verdicts.last().map(rank), Some(2));
    }

    #[test]
    fn marginal_band_sits_between_required_clearance_and_max() {
        let cells = cells(&[(40, -75, 12_000.0)]);
        let analyzer = TerrainAnalyzer::new(&cells);
        let analysis =
            analyzer.analyze_route(&[wp("A", 40.2, -74.8), wp("B", 40.8, -74.2)]);

        assert_eq!(
            analyzer.check_clearance(9999.0, &analysis).verdict,
            Clearance::Unsafe
        );
        assert_eq!(
            analyzer.check_clearance(10_000.0, &analysis).verdict,
            Clearance::Marginal
        );
        assert_eq!(
            analyzer.check_clearance(12_000.0, &analysis).verdict,
            Clearance::Ok
        );
    }

    #[test]
    fn route_without_data_is_ok() {
        let cells = cells(&[]);
        let analyzer = TerrainAnalyzer::new(&cells);
        let analysis = analyzer.analyze_route(&[wp("A", 0.0, 0.0), wp("B", 1.0, 0.0)]);

        assert_eq!(analysis.max_mora_ft, None);
        let report = analyzer.check_clearance(3000.0, &analysis);
        assert_eq!(report.verdict, Clearance::Ok);
    }
}
