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

//! The fallback aviation source (OurAirports community data).
//!
//! Fills identifiers the authoritative source lacks; the merge never lets it
//! override. Runway and frequency parts key records by the dataset's
//! internal numeric airport id, so parsing builds a reverse id → ident map
//! from the airport part and resolves to canonical keys before returning.

use async_trait::async_trait;
use log::warn;
use serde::Deserialize;
use std::collections::HashMap;

use super::source::{read_csv, DataSource, RawSource, SourceData, SourcePart};
use crate::error::Result;
use crate::nd::{Airport, AirportType, Frequency, Navaid, NavaidType, Runway, SourceTag};

const DEFAULT_BASE_URL: &str = "https://davidmegginson.github.io/ourairports-data";

const PARTS: [&str; 4] = ["airports", "navaids", "runways", "frequencies"];

/// The fallback source.
pub struct OurAirportsSource {
    base_url: String,
}

impl OurAirportsSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for OurAirportsSource {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[derive(Debug, Deserialize)]
struct AirportRecord {
    id: u64,
    ident: String,
    #[serde(rename = "type")]
    kind: String,
    name: String,
    latitude_deg: f64,
    longitude_deg: f64,
    elevation_ft: Option<f64>,
    iso_country: String,
    municipality: String,
    iata_code: String,
}

#[derive(Debug, Deserialize)]
struct NavaidRecord {
    ident: String,
    name: String,
    #[serde(rename = "type")]
    kind: String,
    frequency_khz: Option<u32>,
    latitude_deg: f64,
    longitude_deg: f64,
    iso_country: String,
}

#[derive(Debug, Deserialize)]
struct RunwayRecord {
    airport_ref: u64,
    length_ft: Option<f64>,
    surface: String,
    le_ident: String,
    he_ident: String,
}

#[derive(Debug, Deserialize)]
struct FrequencyRecord {
    airport_ref: u64,
    #[serde(rename = "type")]
    kind: String,
    frequency_mhz: f64,
}

fn airport_type(kind: &str) -> AirportType {
    match kind {
        "large_airport" => AirportType::Large,
        "medium_airport" => AirportType::Medium,
        "heliport" => AirportType::Heliport,
        "seaplane_base" => AirportType::Seaplane,
        "closed" => AirportType::Closed,
        _ => AirportType::Small,
    }
}

fn navaid_type(kind: &str) -> NavaidType {
    match kind {
        "VOR-DME" => NavaidType::VorDme,
        "VORTAC" => NavaidType::Vortac,
        "DME" => NavaidType::Dme,
        "NDB" => NavaidType::Ndb,
        "NDB-DME" => NavaidType::NdbDme,
        "TACAN" => NavaidType::Tacan,
        _ => NavaidType::Vor,
    }
}

#[async_trait(?Send)]
impl DataSource for OurAirportsSource {
    fn tag(&self) -> SourceTag {
        SourceTag::OurAirports
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

        // the airport part carries both keys, so the reverse lookup for the
        // internally keyed parts is built here
        let mut ident_by_id: HashMap<u64, String> = HashMap::new();

        for record in read_csv::<AirportRecord>(raw, "airports")? {
            ident_by_id.insert(record.id, record.ident.clone());
            data.airports.push(Airport {
                airport_type: airport_type(&record.kind),
                ident: record.ident,
                name: record.name,
                point: geo::Point::new(record.longitude_deg, record.latitude_deg),
                elevation_ft: record.elevation_ft,
                municipality: record.municipality,
                country: record.iso_country,
                iata: (!record.iata_code.is_empty()).then_some(record.iata_code),
                source: SourceTag::OurAirports,
            });
        }

        for record in read_csv::<NavaidRecord>(raw, "navaids")? {
            data.navaids.push(Navaid {
                navaid_type: navaid_type(&record.kind),
                ident: record.ident,
                name: record.name,
                point: geo::Point::new(record.longitude_deg, record.latitude_deg),
                freq_khz: record.frequency_khz,
                country: record.iso_country,
            });
        }

        for record in read_csv::<RunwayRecord>(raw, "runways")? {
            let Some(ident) = ident_by_id.get(&record.airport_ref) else {
                warn!("runway references unknown airport id {}", record.airport_ref);
                continue;
            };
            data.runways.push((
                ident.clone(),
                Runway {
                    le_ident: record.le_ident,
                    he_ident: record.he_ident,
                    length_ft: record.length_ft,
                    surface: record.surface,
                },
            ));
        }

        for record in read_csv::<FrequencyRecord>(raw, "frequencies")? {
            let Some(ident) = ident_by_id.get(&record.airport_ref) else {
                warn!(
                    "frequency references unknown airport id {}",
                    record.airport_ref
                );
                continue;
            };
            data.frequencies.push((
                ident.clone(),
                Frequency {
                    kind: record.kind,
                    mhz: record.frequency_mhz,
                },
            ));
        }

        Ok(data)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::collections::BTreeMap;

    use super::super::source::RawSource;

    pub const AIRPORTS: &str = "\
id,ident,type,name,latitude_deg,longitude_deg,elevation_ft,iso_country,municipality,iata_code
3622,KJFK,large_airport,John F Kennedy International Airport,40.639751,-73.778925,13,US,New York,JFK
16870,CYYZ,large_airport,Lester B Pearson International Airport,43.677223,-79.630556,569,CA,Toronto,YYZ
";

    pub const NAVAIDS: &str = "\
id,ident,name,type,frequency_khz,latitude_deg,longitude_deg,iso_country
86738,YYZ,Toronto,VOR-DME,113300,43.672779,-79.630556,CA
";

    pub const RUNWAYS: &str = "\
id,airport_ref,length_ft,surface,le_ident,he_ident
228403,16870,11120,ASP,05,23
";

    pub const FREQUENCIES: &str = "\
id,airport_ref,type,frequency_mhz
58799,16870,TWR,118.7
";

    pub fn raw() -> RawSource {
        let mut parts = BTreeMap::new();
        parts.insert("airports".to_string(), AIRPORTS.as_bytes().to_vec());
        parts.insert("navaids".to_string(), NAVAIDS.as_bytes().to_vec());
        parts.insert("runways".to_string(), RUNWAYS.as_bytes().to_vec());
        parts.insert("frequencies".to_string(), FREQUENCIES.as_bytes().to_vec());
        RawSource { parts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_ids_resolve_to_canonical_keys() {
        let data = OurAirportsSource::default().parse(&fixtures::raw()).unwrap();

        assert_eq!(data.airports.len(), 2);
        assert_eq!(data.runways.len(), 1);
        assert_eq!(data.runways[0].0, "CYYZ");
        assert_eq!(data.frequencies[0].0, "CYYZ");
    }

    #[test]
    fn unknown_airport_ref_is_dropped() {
        let mut raw = fixtures::raw();
        raw.parts.insert(
            "runways".to_string(),
            b"id,airport_ref,length_ft,surface,le_ident,he_ident\n1,999999,5000,ASP,09,27\n"
                .to_vec(),
        );
        let data = OurAirportsSource::default().parse(&raw).unwrap();
        assert!(data.runways.is_empty());
    }

    #[test]
    fn fallback_has_no_enroute_structure() {
        let data = OurAirportsSource::default().parse(&fixtures::raw()).unwrap();
        assert!(data.fixes.is_empty());
        assert!(data.airways.is_empty());
        assert!(data.procedures.is_empty());
        assert!(data.validity.is_none());
    }
}
