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

//! Query engine over the navigation data stores.
//!
//! The engine owns nothing but indexes; entity data stays in
//! [`NavigationData`]. The token-type index answers the parser's "what kind
//! of token is this identifier" question in constant time; the trie backs
//! autocomplete; the 1° cell grid backs spatial queries.

use std::collections::BTreeMap;
use std::rc::Rc;

use geo::Point;

use super::spatial::{Bounds, CellGrid};
use super::{Airport, Airway, Fix, NavigationData, Navaid, Procedure, TokenKind};
use crate::fc;
use crate::measurements::Length;

/// Default proximity threshold for [`Query::near_route`].
pub const NEAR_ROUTE_RADIUS: Length = Length::nm(45.0);

/// Answers "what kind of token is this identifier".
///
/// The parser consumes this seam instead of the full query engine so it can
/// run without a repository (regex-only airway detection in tests and
/// offline validation).
pub trait TokenTypes {
    fn token_type(&self, ident: &str) -> Option<TokenKind>;
}

/// One autocomplete entry.
#[derive(Clone, PartialEq, Debug)]
pub struct SearchHit {
    pub ident: String,
    pub kind: TokenKind,
    pub name: String,
}

/// The previous route token, used to bias autocomplete.
#[derive(Clone, PartialEq, Debug)]
pub struct SearchContext {
    pub ident: String,
    pub kind: TokenKind,
}

#[derive(Clone, Debug)]
struct SearchEntry {
    ident: String,
    kind: TokenKind,
    name: String,
    point: Point<f64>,
}

/// Indexes built once per load over the entity stores.
#[derive(Clone, Debug, Default)]
pub struct QueryIndex {
    token_types: std::collections::HashMap<String, TokenKind>,
    entries: Vec<SearchEntry>,
    trie: Trie,
    /// Airports and navaids bucketed into 1° cells, by entry index.
    grid: CellGrid<usize>,
}

impl QueryIndex {
    /// Builds all indexes.
    ///
    /// Token-type build order, first writer wins: airports whose key is ≥ 4
    /// characters or a 3-character local identifier containing a digit, then
    /// navaids, fixes, airways, and finally procedures under both their name
    /// and computer code. IATA codes are never inserted.
    pub fn build(nd: &NavigationData) -> Self {
        let mut index = Self::default();

        for ident in nd.airports.keys() {
            if ident.len() >= 4 || (ident.len() == 3 && ident.chars().any(|c| c.is_ascii_digit()))
            {
                index
                    .token_types
                    .entry(ident.clone())
                    .or_insert(TokenKind::Airport);
            }
        }
        for ident in nd.navaids.keys() {
            index
                .token_types
                .entry(ident.clone())
                .or_insert(TokenKind::Navaid);
        }
        for ident in nd.fixes.keys() {
            index
                .token_types
                .entry(ident.clone())
                .or_insert(TokenKind::Fix);
        }
        for ident in nd.airways.keys() {
            index
                .token_types
                .entry(ident.clone())
                .or_insert(TokenKind::Airway);
        }
        for key in nd.procedures.keys() {
            index
                .token_types
                .entry(key.clone())
                .or_insert(TokenKind::Procedure);
        }

        for arpt in nd.airports.values() {
            index.push_entry(&arpt.ident, TokenKind::Airport, &arpt.name, arpt.point, true);
        }
        for navaid in nd.navaids.values() {
            index.push_entry(
                &navaid.ident,
                TokenKind::Navaid,
                &navaid.name,
                navaid.point,
                true,
            );
        }
        for fix in nd.fixes.values() {
            index.push_entry(&fix.ident, TokenKind::Fix, "", fix.point, false);
        }

        index
    }

    fn push_entry(
        &mut self,
        ident: &str,
        kind: TokenKind,
        name: &str,
        point: Point<f64>,
        spatial: bool,
    ) {
        let idx = self.entries.len();
        self.entries.push(SearchEntry {
            ident: ident.to_string(),
            kind,
            name: name.to_string(),
            point,
        });
        self.trie.insert(ident, idx);
        if spatial {
            self.grid.insert(point.y(), point.x(), idx);
        }
    }

    pub fn token_type(&self, ident: &str) -> Option<TokenKind> {
        self.token_types.get(ident).copied()
    }
}

/// Borrowed read view combining the stores and their indexes.
#[derive(Copy, Clone)]
pub struct Query<'a> {
    nd: &'a NavigationData,
    index: &'a QueryIndex,
}

impl<'a> Query<'a> {
    pub fn new(nd: &'a NavigationData, index: &'a QueryIndex) -> Self {
        Self { nd, index }
    }

    pub fn token_type(&self, ident: &str) -> Option<TokenKind> {
        self.index.token_type(ident)
    }

    pub fn airport(&self, ident: &str) -> Option<Rc<Airport>> {
        self.nd.airport(ident)
    }

    pub fn navaid(&self, ident: &str) -> Option<Rc<Navaid>> {
        self.nd.navaid(ident)
    }

    pub fn fix(&self, ident: &str) -> Option<Rc<Fix>> {
        self.nd.fix(ident)
    }

    pub fn airway(&self, ident: &str) -> Option<Rc<Airway>> {
        self.nd.airway(ident)
    }

    pub fn procedure(&self, key: &str) -> Option<Rc<Procedure>> {
        self.nd.procedure(key)
    }

    pub fn iata_to_icao(&self, iata: &str) -> Option<&'a str> {
        self.nd.iata_to_icao(iata)
    }

    /// Procedures in store order, each yielded once.
    pub fn procedures(&self) -> impl Iterator<Item = &'a Rc<Procedure>> {
        self.nd
            .procedures
            .iter()
            .filter(|(key, proc)| **key == proc.computer_code)
            .map(|(_, proc)| proc)
    }

    /// Ranked, context-aware autocomplete.
    ///
    /// Ranking is exact < prefix < substring < name-match. When the previous
    /// token is supplied, its kind biases the results: after an airport the
    /// airport's procedures surface first, after a fix or navaid the airways
    /// containing it do.
    pub fn search(
        &self,
        query: &str,
        limit: usize,
        context: Option<&SearchContext>,
    ) -> Vec<SearchHit> {
        let q = query.trim().to_uppercase();
        let mut ranked: Vec<(u8, SearchHit)> = Vec::new();

        if let Some(ctx) = context {
            self.context_hits(&q, ctx, &mut ranked);
        }

        if !q.is_empty() {
            // exact hits by canonical kind
            if let Some(kind) = self.index.token_type(&q) {
                ranked.push((
                    1,
                    SearchHit {
                        ident: q.clone(),
                        kind,
                        name: self.display_name(&q, kind),
                    },
                ));
            }

            let mut prefix_idx = Vec::new();
            self.index.trie.collect_prefix(&q, &mut prefix_idx);
            for idx in prefix_idx {
                let entry = &self.index.entries[idx];
                ranked.push((2, hit_from(entry)));
            }

            for entry in &self.index.entries {
                if entry.ident.contains(&q) && !entry.ident.starts_with(&q) {
                    ranked.push((3, hit_from(entry)));
                } else if !entry.name.is_empty() && entry.name.to_uppercase().contains(&q) {
                    ranked.push((4, hit_from(entry)));
                }
            }
        }

        ranked.sort_by(|(ra, a), (rb, b)| ra.cmp(rb).then_with(|| a.ident.cmp(&b.ident)));
        let mut seen = std::collections::HashSet::new();
        ranked
            .into_iter()
            .filter(|(_, hit)| seen.insert((hit.ident.clone(), hit.kind)))
            .map(|(_, hit)| hit)
            .take(limit)
            .collect()
    }

    fn context_hits(&self, q: &str, ctx: &SearchContext, out: &mut Vec<(u8, SearchHit)>) {
        match ctx.kind {
            TokenKind::Airport => {
                let code_prefix = format!("{}.", ctx.ident);
                for proc in self.procedures() {
                    let matches_ctx = proc.computer_code.starts_with(&code_prefix)
                        || proc.airport == ctx.ident;
                    if matches_ctx && (q.is_empty() || proc.name.starts_with(q)) {
                        out.push((
                            0,
                            SearchHit {
                                ident: proc.name.clone(),
                                kind: TokenKind::Procedure,
                                name: proc.computer_code.clone(),
                            },
                        ));
                    }
                }
            }
            TokenKind::Fix | TokenKind::Navaid => {
                for airway in self.nd.airways.values() {
                    if airway.position_of(&ctx.ident).is_some()
                        && (q.is_empty() || airway.ident.starts_with(q))
                    {
                        out.push((
                            0,
                            SearchHit {
                                ident: airway.ident.clone(),
                                kind: TokenKind::Airway,
                                name: String::new(),
                            },
                        ));
                    }
                }
            }
            _ => {}
        }
    }

    fn display_name(&self, ident: &str, kind: TokenKind) -> String {
        match kind {
            TokenKind::Airport => self
                .nd
                .airport(ident)
                .map(|a| a.name.clone())
                .unwrap_or_default(),
            TokenKind::Navaid => self
                .nd
                .navaid(ident)
                .map(|n| n.name.clone())
                .unwrap_or_default(),
            TokenKind::Procedure => self
                .nd
                .procedure(ident)
                .map(|p| p.computer_code.clone())
                .unwrap_or_default(),
            _ => String::new(),
        }
    }

    /// Airports and navaids inside the bounds.
    pub fn in_bounds(&self, bounds: &Bounds) -> Vec<SearchHit> {
        let mut hits: Vec<SearchHit> = self
            .index
            .grid
            .in_bounds(bounds)
            .filter(|&&idx| bounds.contains(self.index.entries[idx].point))
            .map(|&idx| hit_from(&self.index.entries[idx]))
            .collect();
        hits.sort_by(|a, b| a.ident.cmp(&b.ident));
        hits
    }

    /// Airports and navaids near the route.
    ///
    /// Proximity per leg is approximated as the minimum of the candidate's
    /// distance to the leg's two endpoints and its midpoint.
    pub fn near_route(
        &self,
        legs: &[(Point<f64>, Point<f64>)],
        radius: Option<Length>,
    ) -> Vec<SearchHit> {
        let radius = radius.unwrap_or(NEAR_ROUTE_RADIUS);
        let radius_deg = radius.as_nm() / 60.0;

        let mut keys = std::collections::HashSet::new();
        for (from, to) in legs {
            let bounds = Bounds {
                min_lat: from.y().min(to.y()) - radius_deg,
                max_lat: from.y().max(to.y()) + radius_deg,
                min_lon: from.x().min(to.x()) - radius_deg * 2.0,
                max_lon: from.x().max(to.x()) + radius_deg * 2.0,
            };
            keys.extend(bounds.cell_keys());
        }

        let mut candidates: Vec<usize> = keys
            .iter()
            .flat_map(|&key| self.index.grid.cell(key).iter().copied())
            .collect();
        candidates.sort_unstable();
        candidates.dedup();

        let mut hits: Vec<SearchHit> = candidates
            .into_iter()
            .filter(|&idx| {
                let p = self.index.entries[idx].point;
                legs.iter().any(|&(from, to)| {
                    let mid = fc::intermediate_point(from, to, 0.5);
                    [from, to, mid]
                        .iter()
                        .map(|&anchor| fc::haversine(anchor, p).0.as_nm())
                        .fold(f64::INFINITY, f64::min)
                        <= radius.as_nm()
                })
            })
            .map(|idx| hit_from(&self.index.entries[idx]))
            .collect();
        hits.sort_by(|a, b| a.ident.cmp(&b.ident));
        hits
    }
}

impl TokenTypes for Query<'_> {
    fn token_type(&self, ident: &str) -> Option<TokenKind> {
        Query::token_type(self, ident)
    }
}

fn hit_from(entry: &SearchEntry) -> SearchHit {
    SearchHit {
        ident: entry.ident.clone(),
        kind: entry.kind,
        name: entry.name.clone(),
    }
}

/////////////////////////////////////////////////////////////////////////////
// Prefix trie
/////////////////////////////////////////////////////////////////////////////

#[derive(Clone, Debug, Default)]
struct Trie {
    root: TrieNode,
}

#[derive(Clone, Debug, Default)]
struct TrieNode {
    children: BTreeMap<u8, TrieNode>,
    entries: Vec<usize>,
}

impl Trie {
    fn insert(&mut self, key: &str, entry: usize) {
        let mut node = &mut self.root;
        for byte in key.bytes() {
            node = node.children.entry(byte).or_default();
        }
        node.entries.push(entry);
    }

    /// Entry indexes for every key starting with `prefix`, in key order.
    fn collect_prefix(&self, prefix: &str, out: &mut Vec<usize>) {
        let mut node = &self.root;
        for byte in prefix.bytes() {
            match node.children.get(&byte) {
                Some(child) => node = child,
                None => return,
            }
        }
        Self::collect_subtree(node, out);
    }

    fn collect_subtree(node: &TrieNode, out: &mut Vec<usize>) {
        out.extend(node.entries.iter().copied());
        for child in node.children.values() {
            Self::collect_subtree(child, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nd::{AirportType, ProcedureKind, SourceTag};

    fn airport(ident: &str, name: &str, lat: f64, lon: f64) -> Airport {
        Airport {
            ident: ident.to_string(),
            name: name.to_string(),
            point: Point::new(lon, lat),
            elevation_ft: Some(13.0),
            municipality: String::new(),
            country: "US".to_string(),
            iata: None,
            airport_type: AirportType::Large,
            source: SourceTag::Nasr,
        }
    }

    fn fix(ident: &str, lat: f64, lon: f64) -> Fix {
        Fix {
            ident: ident.to_string(),
            point: Point::new(lon, lat),
            reporting: true,
            state: String::new(),
            country: "US".to_string(),
        }
    }

    fn navaid(ident: &str, name: &str, lat: f64, lon: f64) -> Navaid {
        Navaid {
            ident: ident.to_string(),
            name: name.to_string(),
            point: Point::new(lon, lat),
            navaid_type: crate::nd::NavaidType::Vor,
            freq_khz: Some(113_800),
            country: "US".to_string(),
        }
    }

    fn sample_nd() -> NavigationData {
        let mut nd = NavigationData::new();
        nd.add_airport(airport("KJFK", "John F Kennedy Intl", 40.639751, -73.778925));
        nd.add_airport(airport("1B1", "Columbia County", 42.291198, -73.710289));
        nd.add_navaid(navaid("RBV", "Robbinsville", 40.202331, -74.495017));
        nd.add_fix(fix("PAYGE", 40.5, -75.0));
        // a fix that shares its ident with a navaid: fix comes later in the
        // build order, so the navaid keeps the token type
        nd.add_fix(fix("RBV", 40.2, -74.5));
        nd.add_airway(Airway {
            ident: "Q430".to_string(),
            fixes: vec!["PAYGE".to_string(), "AIR".to_string()],
        });
        nd.add_procedure(Procedure {
            name: "CLPRR3".to_string(),
            computer_code: "KCMH.CLPRR3".to_string(),
            kind: ProcedureKind::Star,
            airport: "KCMH".to_string(),
            body: vec!["CLPRR".to_string()],
            transitions: Vec::new(),
        });
        nd
    }

    #[test]
    fn token_types_respect_build_order() {
        let nd = sample_nd();
        let index = QueryIndex::build(&nd);

        assert_eq!(index.token_type("KJFK"), Some(TokenKind::Airport));
        // 3 characters containing a digit is a local airport identifier
        assert_eq!(index.token_type("1B1"), Some(TokenKind::Airport));
        // the navaid claimed RBV before the fix could
        assert_eq!(index.token_type("RBV"), Some(TokenKind::Navaid));
        assert_eq!(index.token_type("PAYGE"), Some(TokenKind::Fix));
        assert_eq!(index.token_type("Q430"), Some(TokenKind::Airway));
        assert_eq!(index.token_type("CLPRR3"), Some(TokenKind::Procedure));
        assert_eq!(index.token_type("KCMH.CLPRR3"), Some(TokenKind::Procedure));
        assert_eq!(index.token_type("ZZZZZ"), None);
    }

    #[test]
    fn no_identifier_maps_to_two_kinds() {
        let nd = sample_nd();
        let index = QueryIndex::build(&nd);
        // the map structure itself guarantees one kind per ident; spot-check
        // the shadowed fix
        assert_eq!(index.token_type("RBV"), Some(TokenKind::Navaid));
        assert!(nd.fix("RBV").is_some());
    }

    #[test]
    fn search_ranks_exact_before_prefix() {
        let nd = sample_nd();
        let index = QueryIndex::build(&nd);
        let q = Query::new(&nd, &index);

        let hits = q.search("RBV", 10, None);
        assert_eq!(hits[0].ident, "RBV");
        assert_eq!(hits[0].kind, TokenKind::Navaid);
    }

    #[test]
    fn search_finds_by_name() {
        let nd = sample_nd();
        let index = QueryIndex::build(&nd);
        let q = Query::new(&nd, &index);

        let hits = q.search("KENNEDY", 10, None);
        assert!(hits.iter().any(|h| h.ident == "KJFK"));
    }

    #[test]
    fn airport_context_surfaces_procedures() {
        let nd = sample_nd();
        let index = QueryIndex::build(&nd);
        let q = Query::new(&nd, &index);

        let ctx = SearchContext {
            ident: "KCMH".to_string(),
            kind: TokenKind::Airport,
        };
        let hits = q.search("CLP", 10, Some(&ctx));
        assert_eq!(hits[0].ident, "CLPRR3");
        assert_eq!(hits[0].kind, TokenKind::Procedure);
    }

    #[test]
    fn waypoint_context_surfaces_airways() {
        let nd = sample_nd();
        let index = QueryIndex::build(&nd);
        let q = Query::new(&nd, &index);

        let ctx = SearchContext {
            ident: "PAYGE".to_string(),
            kind: TokenKind::Fix,
        };
        let hits = q.search("", 10, Some(&ctx));
        assert_eq!(hits[0].ident, "Q430");
        assert_eq!(hits[0].kind, TokenKind::Airway);
    }

    #[test]
    fn in_bounds_filters_exactly() {
        let nd = sample_nd();
        let index = QueryIndex::build(&nd);
        let q = Query::new(&nd, &index);

        let hits = q.in_bounds(&Bounds {
            min_lat: 40.0,
            max_lat: 41.0,
            min_lon: -74.0,
            max_lon: -73.0,
        });
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].ident, "KJFK");
    }

    #[test]
    fn near_route_uses_endpoint_and_midpoint_distances() {
        let nd = sample_nd();
        let index = QueryIndex::build(&nd);
        let q = Query::new(&nd, &index);

        // a leg passing right over RBV
        let legs = vec![(Point::new(-74.5, 40.0), Point::new(-74.5, 40.4))];
        let hits = q.near_route(&legs, Some(Length::nm(45.0)));
        assert!(hits.iter().any(|h| h.ident == "RBV"));
        // Columbia County is ~120 NM away
        assert!(!hits.iter().any(|h| h.ident == "1B1"));
    }
}
