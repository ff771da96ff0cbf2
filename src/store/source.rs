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

//! Data source capability.
//!
//! A source is a value implementing [`DataSource`] with the template
//! pipeline `fetch → parse → validate → transform`. Concrete sources supply
//! their part URLs and a parser for their record layout; everything else is
//! shared. Futures here are the engine's suspension points: dropping them
//! cancels the load with no partial state written anywhere.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::diag::Diagnostic;
use crate::error::Result;
use crate::nd::{
    Airport, AirspaceClass, Airway, Fix, Frequency, MoraCell, Navaid, Procedure, Runway,
    SourceTag,
};

/// Network timeout applied to every fetch.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// One fetchable piece of a source (a file or endpoint).
#[derive(Clone, PartialEq, Debug)]
pub struct SourcePart {
    pub id: String,
    pub url: String,
}

/// Raw bytes per part as fetched, before any parsing.
#[derive(Clone, Debug, Default)]
pub struct RawSource {
    pub parts: BTreeMap<String, Vec<u8>>,
}

/// The authoritative source's validity window.
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ValidityWindow {
    pub effective: NaiveDate,
    pub expiry: NaiveDate,
}

/// Typed per-source collections produced by parsing.
///
/// Keys on `frequencies`, `runways` and `airspaces` are canonical airport
/// identifiers; a source whose record layout uses internal keys resolves
/// them before returning (see the OurAirports source).
#[derive(Clone, Debug, Default)]
pub struct SourceData {
    pub airports: Vec<Airport>,
    pub navaids: Vec<Navaid>,
    pub fixes: Vec<Fix>,
    pub airways: Vec<Airway>,
    pub procedures: Vec<Procedure>,
    pub frequencies: Vec<(String, Frequency)>,
    pub runways: Vec<(String, Runway)>,
    pub airspaces: Vec<(String, AirspaceClass)>,
    pub mora: Vec<MoraCell>,
    pub validity: Option<ValidityWindow>,
}

impl SourceData {
    pub fn record_count(&self) -> usize {
        self.airports.len()
            + self.navaids.len()
            + self.fixes.len()
            + self.airways.len()
            + self.procedures.len()
            + self.frequencies.len()
            + self.runways.len()
            + self.airspaces.len()
            + self.mora.len()
    }
}

/// A fully loaded source, ready for merging.
#[derive(Debug)]
pub struct LoadedSource {
    pub tag: SourceTag,
    pub raw: RawSource,
    pub data: SourceData,
    pub diagnostics: Vec<Diagnostic>,
    pub elapsed_ms: u64,
}

/// HTTP fetch with the default timeout.
///
/// A fixture client answers only from a pinned URL → bytes map and never
/// touches the network: an unpinned URL fails the fetch. That keeps tests
/// and offline validation deterministic.
pub struct FetchClient {
    client: Option<reqwest::Client>,
    fixtures: BTreeMap<String, Vec<u8>>,
}

impl FetchClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self {
            client: Some(client),
            fixtures: BTreeMap::new(),
        })
    }

    /// An offline client answering only from the given URL → bytes map.
    pub fn fixture(fixtures: BTreeMap<String, Vec<u8>>) -> Self {
        Self {
            client: None,
            fixtures,
        }
    }

    pub async fn get(&self, url: &str) -> Result<Vec<u8>> {
        if let Some(bytes) = self.fixtures.get(url) {
            return Ok(bytes.clone());
        }
        match &self.client {
            Some(client) => {
                let response = client.get(url).send().await?.error_for_status()?;
                Ok(response.bytes().await?.to_vec())
            }
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("offline client has no bytes for {url}"),
            )
            .into()),
        }
    }
}

/// Deserializes one CSV part into records.
pub(crate) fn read_csv<T: serde::de::DeserializeOwned>(
    raw: &RawSource,
    part: &str,
) -> Result<Vec<T>> {
    let bytes = raw
        .parts
        .get(part)
        .ok_or_else(|| crate::error::Error::SourceParse(format!("missing part {part}")))?;
    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(|e| crate::error::Error::SourceParse(format!("{part}: {e}")))
}

/// The pluggable source strategy.
#[async_trait(?Send)]
pub trait DataSource {
    fn tag(&self) -> SourceTag;

    fn parts(&self) -> Vec<SourcePart>;

    /// Fetches every part. The default implementation downloads the part
    /// URLs sequentially through the shared client.
    async fn fetch(&self, client: &FetchClient) -> Result<RawSource> {
        let mut parts = BTreeMap::new();
        for part in self.parts() {
            let bytes = client.get(&part.url).await?;
            parts.insert(part.id, bytes);
        }
        Ok(RawSource { parts })
    }

    /// Parses the raw bytes into typed collections.
    fn parse(&self, raw: &RawSource) -> Result<SourceData>;

    /// Sanity checks on the parsed collections; findings are non-fatal.
    fn validate(&self, _data: &SourceData) -> Vec<Diagnostic> {
        Vec::new()
    }

    /// Source-specific normalization after validation.
    fn transform(&self, data: SourceData) -> SourceData {
        data
    }

    /// The template pipeline: fetch → parse → validate → transform.
    async fn load(&self, client: &FetchClient) -> Result<LoadedSource> {
        let started = Instant::now();
        let raw = self.fetch(client).await?;
        let data = self.parse(&raw)?;
        let diagnostics = self.validate(&data);
        let data = self.transform(data);
        Ok(LoadedSource {
            tag: self.tag(),
            raw,
            data,
            diagnostics,
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TwoPartSource;

    #[async_trait(?Send)]
    impl DataSource for TwoPartSource {
        fn tag(&self) -> SourceTag {
            SourceTag::Nasr
        }

        fn parts(&self) -> Vec<SourcePart> {
            vec![
                SourcePart {
                    id: "A".to_string(),
                    url: "test://a".to_string(),
                },
                SourcePart {
                    id: "B".to_string(),
                    url: "test://b".to_string(),
                },
            ]
        }

        fn parse(&self, raw: &RawSource) -> Result<SourceData> {
            assert_eq!(raw.parts.len(), 2);
            Ok(SourceData::default())
        }
    }

    #[tokio::test]
    async fn fixture_client_serves_pinned_urls() {
        let mut fixtures = BTreeMap::new();
        fixtures.insert("test://a".to_string(), b"alpha".to_vec());
        fixtures.insert("test://b".to_string(), b"bravo".to_vec());
        let client = FetchClient::fixture(fixtures);

        let raw = TwoPartSource.fetch(&client).await.unwrap();
        assert_eq!(raw.parts["A"], b"alpha");
        assert_eq!(raw.parts["B"], b"bravo");
    }

    #[tokio::test]
    async fn load_runs_the_template_pipeline() {
        let mut fixtures = BTreeMap::new();
        fixtures.insert("test://a".to_string(), Vec::new());
        fixtures.insert("test://b".to_string(), Vec::new());
        let client = FetchClient::fixture(fixtures);

        let loaded = TwoPartSource.load(&client).await.unwrap();
        assert_eq!(loaded.tag, SourceTag::Nasr);
        assert!(loaded.diagnostics.is_empty());
    }
}
