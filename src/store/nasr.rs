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

//! The authoritative aviation source (FAA NASR subscription).
//!
//! The subscription ships as per-entity CSV parts. The layouts here are the
//! engine's normalized columns; the byte-exact upstream layout is adapted at
//! the distribution step and is not part of the engine.
//!
//! Parts: `APT_BASE`, `NAV_BASE`, `FIX_BASE`, `AWY_SEG`, `STAR_DP`, `FRQ`,
//! `APT_RWY` and `CYCLE` (the validity window).

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::warn;
use serde::Deserialize;

use super::source::{read_csv, DataSource, RawSource, SourceData, SourcePart, ValidityWindow};
use crate::diag::{Code, Diagnostic};
use crate::error::Result;
use crate::nd::{
    Airport, AirportType, AirspaceClass, Airway, Fix, Frequency, Navaid, NavaidType, Procedure,
    ProcedureKind, Runway, SourceTag, Transition,
};

const DEFAULT_BASE_URL: &str = "https://nfdc.faa.gov/webContent/28DaySub/extra";

const PARTS: [&str; 8] = [
    "APT_BASE", "NAV_BASE", "FIX_BASE", "AWY_SEG", "STAR_DP", "FRQ", "APT_RWY", "CYCLE",
];

/// The authoritative source.
pub struct NasrSource {
    base_url: String,
}

impl NasrSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for NasrSource {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[derive(Debug, Deserialize)]
struct AptRecord {
    ident: String,
    name: String,
    lat: f64,
    lon: f64,
    elevation_ft: Option<f64>,
    city: String,
    country: String,
    iata: String,
    kind: String,
    airspace_class: String,
    airspace_hours: String,
}

#[derive(Debug, Deserialize)]
struct NavRecord {
    ident: String,
    name: String,
    lat: f64,
    lon: f64,
    kind: String,
    freq_khz: Option<u32>,
    country: String,
}

#[derive(Debug, Deserialize)]
struct FixRecord {
    ident: String,
    lat: f64,
    lon: f64,
    reporting: String,
    state: String,
    country: String,
}

#[derive(Debug, Deserialize)]
struct AwySegRecord {
    airway: String,
    seq: u32,
    fix: String,
}

#[derive(Debug, Deserialize)]
struct ProcRecord {
    kind: String,
    name: String,
    computer_code: String,
    airport: String,
    /// Body fixes separated by `;`.
    body: String,
    /// Transitions as `NAME:ENTRY:FIX|FIX` groups separated by `;`.
    transitions: String,
}

#[derive(Debug, Deserialize)]
struct FrqRecord {
    airport: String,
    kind: String,
    mhz: f64,
}

#[derive(Debug, Deserialize)]
struct RwyRecord {
    airport: String,
    le_ident: String,
    he_ident: String,
    length_ft: Option<f64>,
    surface: String,
}

#[derive(Debug, Deserialize)]
struct CycleRecord {
    effective: NaiveDate,
    expiry: NaiveDate,
}

fn airport_type(kind: &str, ident: &str) -> AirportType {
    match kind {
        "large" => AirportType::Large,
        "medium" => AirportType::Medium,
        "small" => AirportType::Small,
        "heliport" => AirportType::Heliport,
        "seaplane" => AirportType::Seaplane,
        "closed" => AirportType::Closed,
        other => {
            warn!("unknown airport type {other:?} for {ident}, keeping as small");
            AirportType::Small
        }
    }
}

fn navaid_type(kind: &str, ident: &str) -> NavaidType {
    match kind {
        "VOR" => NavaidType::Vor,
        "VOR/DME" => NavaidType::VorDme,
        "VORTAC" => NavaidType::Vortac,
        "DME" => NavaidType::Dme,
        "NDB" => NavaidType::Ndb,
        "NDB/DME" => NavaidType::NdbDme,
        "TACAN" => NavaidType::Tacan,
        other => {
            warn!("unknown navaid type {other:?} for {ident}, keeping as VOR");
            NavaidType::Vor
        }
    }
}

fn parse_transitions(encoded: &str) -> Vec<Transition> {
    encoded
        .split(';')
        .filter(|group| !group.is_empty())
        .filter_map(|group| {
            let mut parts = group.splitn(3, ':');
            let name = parts.next()?.to_string();
            let entry = parts.next()?.to_string();
            let fixes = parts
                .next()
                .map(|fixes| {
                    fixes
                        .split('|')
                        .filter(|f| !f.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            Some(Transition { name, entry, fixes })
        })
        .collect()
}

#[async_trait(?Send)]
impl DataSource for NasrSource {
    fn tag(&self) -> SourceTag {
        SourceTag::Nasr
    }

    fn parts(&self) -> Vec<SourcePart> {
        PARTS
            .iter()
            .map(|id| SourcePart {
                id: id.to_string(),
                url: format!("{}/{id}.csv", self.base_url),
            })
            .collect()
    }

    fn parse(&self, raw: &RawSource) -> Result<SourceData> {
        let mut data = SourceData::default();

        for record in read_csv::<AptRecord>(raw, "APT_BASE")? {
            if !record.airspace_class.is_empty() {
                data.airspaces.push((
                    record.ident.clone(),
                    AirspaceClass {
                        class: record.airspace_class.clone(),
                        hours: (!record.airspace_hours.is_empty())
                            .then(|| record.airspace_hours.clone()),
                    },
                ));
            }
            data.airports.push(Airport {
                airport_type: airport_type(&record.kind, &record.ident),
                ident: record.ident,
                name: record.name,
                point: geo::Point::new(record.lon, record.lat),
                elevation_ft: record.elevation_ft,
                municipality: record.city,
                country: record.country,
                iata: (!record.iata.is_empty()).then_some(record.iata),
                source: SourceTag::Nasr,
            });
        }

        for record in read_csv::<NavRecord>(raw, "NAV_BASE")? {
            data.navaids.push(Navaid {
                navaid_type: navaid_type(&record.kind, &record.ident),
                ident: record.ident,
                name: record.name,
                point: geo::Point::new(record.lon, record.lat),
                freq_khz: record.freq_khz,
                country: record.country,
            });
        }

        for record in read_csv::<FixRecord>(raw, "FIX_BASE")? {
            data.fixes.push(Fix {
                ident: record.ident,
                point: geo::Point::new(record.lon, record.lat),
                reporting: record.reporting == "Y",
                state: record.state,
                country: record.country,
            });
        }

        let mut segments: BTreeMap<String, BTreeMap<u32, String>> = BTreeMap::new();
        for record in read_csv::<AwySegRecord>(raw, "AWY_SEG")? {
            segments
                .entry(record.airway)
                .or_default()
                .insert(record.seq, record.fix);
        }
        for (ident, fixes_by_seq) in segments {
            let mut fixes: Vec<String> = Vec::with_capacity(fixes_by_seq.len());
            for fix in fixes_by_seq.into_values() {
                // an airway carries each fix at most once
                if fixes.contains(&fix) {
                    warn!("duplicate fix {fix} on airway {ident} dropped");
                    continue;
                }
                fixes.push(fix);
            }
            data.airways.push(Airway { ident, fixes });
        }

        for record in read_csv::<ProcRecord>(raw, "STAR_DP")? {
            let kind = match record.kind.as_str() {
                "DP" => ProcedureKind::Dp,
                "STAR" => ProcedureKind::Star,
                other => {
                    warn!("unknown procedure kind {other:?} for {}", record.name);
                    continue;
                }
            };
            data.procedures.push(Procedure {
                kind,
                name: record.name,
                computer_code: record.computer_code,
                airport: record.airport,
                body: record
                    .body
                    .split(';')
                    .filter(|f| !f.is_empty())
                    .map(str::to_string)
                    .collect(),
                transitions: parse_transitions(&record.transitions),
            });
        }

        for record in read_csv::<FrqRecord>(raw, "FRQ")? {
            data.frequencies.push((
                record.airport,
                Frequency {
                    kind: record.kind,
                    mhz: record.mhz,
                },
            ));
        }

        for record in read_csv::<RwyRecord>(raw, "APT_RWY")? {
            data.runways.push((
                record.airport,
                Runway {
                    le_ident: record.le_ident,
                    he_ident: record.he_ident,
                    length_ft: record.length_ft,
                    surface: record.surface,
                },
            ));
        }

        data.validity = read_csv::<CycleRecord>(raw, "CYCLE")?
            .first()
            .map(|c| ValidityWindow {
                effective: c.effective,
                expiry: c.expiry,
            });

        Ok(data)
    }

    fn validate(&self, data: &SourceData) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        if data.airports.is_empty() {
            diagnostics
                .push(Diagnostic::data(Code::Validity, "NASR delivered no airports"));
        }

        if let Some(validity) = &data.validity {
            if validity.expiry <= validity.effective {
                diagnostics.push(Diagnostic::data(
                    Code::Validity,
                    format!(
                        "NASR validity window is inverted: {} .. {}",
                        validity.effective, validity.expiry
                    ),
                ));
            }
        }

        diagnostics
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Literal CSV parts shared by the repository and pipeline tests.

    use std::collections::BTreeMap;

    use super::super::source::RawSource;

    pub const APT_BASE: &str = "\
ident,name,lat,lon,elevation_ft,city,country,iata,kind,airspace_class,airspace_hours
KJFK,John F Kennedy Intl,40.639751,-73.778925,13,New York,US,JFK,large,B,
KORD,Chicago O'Hare Intl,41.978603,-87.904842,672,Chicago,US,ORD,large,B,
KCMH,John Glenn Columbus Intl,39.998056,-82.891944,815,Columbus,US,CMH,medium,C,
KLAX,Los Angeles Intl,33.942536,-118.408075,125,Los Angeles,US,LAX,large,B,
1B1,Columbia County,42.291198,-73.710289,200,Hudson,US,,small,,
";

    pub const NAV_BASE: &str = "\
ident,name,lat,lon,kind,freq_khz,country
RBV,Robbinsville,40.202331,-74.495017,VORTAC,113800,US
AIR,Bellaire,40.017139,-80.817417,VOR/DME,117100,US
FNT,Flint,42.970025,-83.744581,VORTAC,116900,US
";

    pub const FIX_BASE: &str = "\
ident,lat,lon,reporting,state,country
PAYGE,40.559367,-75.623214,Y,PA,US
DORET,40.248253,-77.416714,N,PA,US
BUCKO,41.432617,-82.648128,N,OH,US
CLPRR,40.3071,-82.2173,Y,OH,US
ARRAN,40.1584,-82.4391,N,OH,US
HOOPZ,40.0521,-82.6447,N,OH,US
";

    pub const AWY_SEG: &str = "\
airway,seq,fix
Q430,10,RBV
Q430,20,PAYGE
Q430,30,DORET
Q430,40,AIR
Q430,50,BUCKO
Q430,60,FNT
";

    pub const STAR_DP: &str = "\
kind,name,computer_code,airport,body,transitions
STAR,CLPRR3,KCMH.CLPRR3,KCMH,CLPRR;ARRAN;HOOPZ,AIR:AIR:AIR
DP,HIDEY1,HIDEY1.HIDEY,KJFK,HIDEY,
";

    pub const FRQ: &str = "\
airport,kind,mhz
KJFK,TWR,119.1
KJFK,ATIS,128.725
KCMH,TWR,132.7
";

    pub const APT_RWY: &str = "\
airport,le_ident,he_ident,length_ft,surface
KJFK,04L,22R,12079,ASPH
KCMH,10L,28R,10113,ASPH
";

    pub const CYCLE: &str = "\
effective,expiry
2026-07-09,2099-01-01
";

    /// The full authoritative fixture as a fetched raw source.
    pub fn raw() -> RawSource {
        let mut parts = BTreeMap::new();
        parts.insert("APT_BASE".to_string(), APT_BASE.as_bytes().to_vec());
        parts.insert("NAV_BASE".to_string(), NAV_BASE.as_bytes().to_vec());
        parts.insert("FIX_BASE".to_string(), FIX_BASE.as_bytes().to_vec());
        parts.insert("AWY_SEG".to_string(), AWY_SEG.as_bytes().to_vec());
        parts.insert("STAR_DP".to_string(), STAR_DP.as_bytes().to_vec());
        parts.insert("FRQ".to_string(), FRQ.as_bytes().to_vec());
        parts.insert("APT_RWY".to_string(), APT_RWY.as_bytes().to_vec());
        parts.insert("CYCLE".to_string(), CYCLE.as_bytes().to_vec());
        RawSource { parts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_parts() {
        let data = NasrSource::default().parse(&fixtures::raw()).unwrap();

        assert_eq!(data.airports.len(), 5);
        assert_eq!(data.navaids.len(), 3);
        assert_eq!(data.fixes.len(), 6);
        assert_eq!(data.airways.len(), 1);
        assert_eq!(data.procedures.len(), 2);
        assert_eq!(data.frequencies.len(), 3);
        assert_eq!(data.runways.len(), 2);
        assert_eq!(data.airspaces.len(), 4);
        assert!(data.validity.is_some());
    }

    #[test]
    fn airway_sequence_is_ordered_by_seq() {
        let data = NasrSource::default().parse(&fixtures::raw()).unwrap();
        let q430 = &data.airways[0];
        assert_eq!(q430.ident, "Q430");
        assert_eq!(
            q430.fixes,
            vec!["RBV", "PAYGE", "DORET", "AIR", "BUCKO", "FNT"]
        );
    }

    #[test]
    fn star_carries_transition() {
        let data = NasrSource::default().parse(&fixtures::raw()).unwrap();
        let star = data
            .procedures
            .iter()
            .find(|p| p.name == "CLPRR3")
            .unwrap();
        assert_eq!(star.kind, ProcedureKind::Star);
        assert_eq!(star.computer_code, "KCMH.CLPRR3");
        assert_eq!(star.body, vec!["CLPRR", "ARRAN", "HOOPZ"]);
        assert_eq!(star.transitions.len(), 1);
        assert_eq!(star.transitions[0].name, "AIR");
    }

    #[test]
    fn validity_window_is_read_from_cycle() {
        let data = NasrSource::default().parse(&fixtures::raw()).unwrap();
        let validity = data.validity.unwrap();
        assert_eq!(
            validity.effective,
            NaiveDate::from_ymd_opt(2026, 7, 9).unwrap()
        );
        assert_eq!(validity.expiry, NaiveDate::from_ymd_opt(2099, 1, 1).unwrap());
    }

    #[test]
    fn empty_airports_is_flagged() {
        let source = NasrSource::default();
        let diagnostics = source.validate(&SourceData::default());
        assert!(diagnostics.iter().any(|d| d.code == Code::Validity));
    }

    #[test]
    fn missing_part_is_a_parse_error() {
        let mut raw = fixtures::raw();
        raw.parts.remove("NAV_BASE");
        assert!(NasrSource::default().parse(&raw).is_err());
    }
}
