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

//! The MORA grid source.
//!
//! One CSV part with a row per 1° cell. Cells are loaded once globally and
//! treated as permanent until the operator refreshes the repository.

use async_trait::async_trait;
use serde::Deserialize;

use super::source::{read_csv, DataSource, RawSource, SourceData, SourcePart};
use crate::error::Result;
use crate::nd::{MoraCell, MoraSource, SourceTag};

const DEFAULT_URL: &str = "https://navdata.inflight.app/mora/grid.csv";

/// The MORA cell source.
pub struct MoraGridSource {
    url: String,
}

impl MoraGridSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for MoraGridSource {
    fn default() -> Self {
        Self::new(DEFAULT_URL)
    }
}

#[derive(Debug, Deserialize)]
struct MoraRecord {
    lat: i16,
    lon: i16,
    mora_ft: f64,
    source: String,
}

#[async_trait(?Send)]
impl DataSource for MoraGridSource {
    fn tag(&self) -> SourceTag {
        SourceTag::Mora
    }

    fn parts(&self) -> Vec<SourcePart> {
        vec![SourcePart {
            id: "MORA".to_string(),
            url: self.url.clone(),
        }]
    }

    fn parse(&self, raw: &RawSource) -> Result<SourceData> {
        let mut data = SourceData::default();
        for record in read_csv::<MoraRecord>(raw, "MORA")? {
            data.mora.push(MoraCell {
                lat: record.lat,
                lon: record.lon,
                mora_ft: record.mora_ft,
                source: if record.source == "terrain" {
                    MoraSource::TerrainDerived
                } else {
                    MoraSource::Authoritative
                },
            });
        }
        Ok(data)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::collections::BTreeMap;

    use super::super::source::RawSource;

    pub const MORA: &str = "\
lat,lon,mora_ft,source
40,-75,2800,authoritative
40,-76,3100,authoritative
41,-84,2300,terrain
39,-83,2600,authoritative
";

    pub fn raw() -> RawSource {
        let mut parts = BTreeMap::new();
        parts.insert("MORA".to_string(), MORA.as_bytes().to_vec());
        RawSource { parts }
    }
}
