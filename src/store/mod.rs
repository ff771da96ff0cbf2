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

//! Data repository.
//!
//! Sole source of truth for aviation data. Loads the authoritative source,
//! the fallback and the MORA grid concurrently, merges them (authoritative
//! first, fallback adds-only), persists a checksummed snapshot and answers
//! read queries through the borrowed [`Query`] view.

use std::collections::BTreeMap;
use std::rc::Rc;

use chrono::{NaiveDate, Utc};
use log::{debug, info, warn};

use crate::diag::{Code, Diagnostic};
use crate::error::{Error, Result};
use crate::nd::{
    Airport, Airway, EntityCounts, Fix, MoraCell, NavigationData, Navaid, Procedure, Query,
    QueryIndex, SourceTag,
};

pub mod cache;
pub mod mora_source;
pub mod nasr;
pub mod ourairports;
pub mod source;

pub use cache::{Cache, FileMeta, Snapshot, FALLBACK_VALIDITY_DAYS, SNAPSHOT_VERSION};
pub use mora_source::MoraGridSource;
pub use nasr::NasrSource;
pub use ourairports::OurAirportsSource;
pub use source::{
    DataSource, FetchClient, LoadedSource, RawSource, SourceData, SourcePart, ValidityWindow,
};

/// The three sources a repository loads from, in merge priority order.
pub struct SourceSet {
    pub authoritative: Box<dyn DataSource>,
    pub fallback: Box<dyn DataSource>,
    pub mora: Box<dyn DataSource>,
}

impl Default for SourceSet {
    fn default() -> Self {
        Self {
            authoritative: Box::new(NasrSource::default()),
            fallback: Box::new(OurAirportsSource::default()),
            mora: Box::new(MoraGridSource::default()),
        }
    }
}

/// Progress events reported to the load status callback.
#[derive(Clone, Debug)]
pub enum LoadProgress {
    CacheHit { timestamp_ms: i64 },
    SourceStarted(SourceTag),
    SourceLoaded { tag: SourceTag, records: usize, elapsed_ms: u64 },
    SourceFailed { tag: SourceTag, message: String },
    SnapshotWritten { payload_bytes: usize },
}

/// Counts, snapshot timestamp and sources of the current load.
#[derive(Clone, Debug, Default)]
pub struct RepositoryStats {
    pub counts: EntityCounts,
    pub timestamp_ms: Option<i64>,
    pub data_sources: Vec<SourceTag>,
    pub file_metadata: BTreeMap<String, FileMeta>,
}

/// The aviation data repository.
pub struct Repository {
    nd: NavigationData,
    index: QueryIndex,
    cache: Cache,
    sources: SourceSet,
    compress_raw: bool,
    data_sources: Vec<SourceTag>,
    file_metadata: BTreeMap<String, FileMeta>,
    nasr_info: Option<ValidityWindow>,
    timestamp_ms: Option<i64>,
    diagnostics: Vec<Diagnostic>,
}

impl Repository {
    pub fn new(cache: Cache, sources: SourceSet) -> Self {
        Self {
            nd: NavigationData::new(),
            index: QueryIndex::default(),
            cache,
            sources,
            compress_raw: true,
            data_sources: Vec::new(),
            file_metadata: BTreeMap::new(),
            nasr_info: None,
            timestamp_ms: None,
            diagnostics: Vec::new(),
        }
    }

    /// Disables gzip on the retained raw source blobs.
    pub fn without_raw_compression(mut self) -> Self {
        self.compress_raw = false;
        self
    }

    /// Diagnostics accumulated by the last load, reindex or cache read.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Borrowed read view over stores and indexes.
    pub fn query(&self) -> Query<'_> {
        Query::new(&self.nd, &self.index)
    }

    pub fn nd(&self) -> &NavigationData {
        &self.nd
    }

    pub fn get_airport(&self, ident: &str) -> Option<Rc<Airport>> {
        self.nd.airport(ident)
    }

    pub fn get_navaid(&self, ident: &str) -> Option<Rc<Navaid>> {
        self.nd.navaid(ident)
    }

    pub fn get_fix(&self, ident: &str) -> Option<Rc<Fix>> {
        self.nd.fix(ident)
    }

    pub fn get_airway(&self, ident: &str) -> Option<Rc<Airway>> {
        self.nd.airway(ident)
    }

    pub fn get_procedure(&self, key: &str) -> Option<Rc<Procedure>> {
        self.nd.procedure(key)
    }

    pub fn get_mora(&self, key: (i16, i16)) -> Option<MoraCell> {
        self.nd.mora_cell(key).copied()
    }

    pub fn stats(&self) -> RepositoryStats {
        RepositoryStats {
            counts: self.nd.counts(),
            timestamp_ms: self.timestamp_ms,
            data_sources: self.data_sources.clone(),
            file_metadata: self.file_metadata.clone(),
        }
    }

    /// Loads the repository: cache first, network when the cache is missing,
    /// stale or damaged.
    pub async fn load(
        &mut self,
        client: &FetchClient,
        progress: &mut dyn FnMut(LoadProgress),
    ) -> Result<()> {
        self.diagnostics.clear();

        match self.load_from_cache_inner() {
            Ok(()) if !self.snapshot_expired(Utc::now().date_naive()) => {
                info!("repository ready from cache snapshot");
                progress(LoadProgress::CacheHit {
                    timestamp_ms: self.timestamp_ms.unwrap_or_default(),
                });
                return Ok(());
            }
            Ok(()) => {
                debug!("cache snapshot expired, refreshing from network");
            }
            Err(Error::NoSnapshot) => {
                debug!("no cache snapshot, cold start");
            }
            Err(e) => {
                warn!("cache unusable: {e}");
            }
        }

        self.load_from_network(client, progress).await
    }

    /// Loads from the persistent snapshot only.
    pub fn load_from_cache(&mut self) -> Result<()> {
        self.diagnostics.clear();
        self.load_from_cache_inner()
    }

    fn load_from_cache_inner(&mut self) -> Result<()> {
        let snapshot = match self.cache.read() {
            Ok(snapshot) => snapshot,
            Err(Error::NoSnapshot) => return Err(Error::NoSnapshot),
            Err(Error::UnknownSnapshotVersion(v)) => {
                self.diagnostics.push(Diagnostic::cache(
                    Code::UnknownSnapshotVersion,
                    format!("snapshot version {v} unknown, forcing full reload"),
                ));
                self.cache.clear()?;
                return Err(Error::UnknownSnapshotVersion(v));
            }
            Err(e) => {
                self.diagnostics.push(Diagnostic::cache(
                    Code::ChecksumMismatch,
                    format!("snapshot unreadable, deleted: {e}"),
                ));
                self.cache.clear()?;
                return Err(e);
            }
        };

        if let Err(e) = snapshot.verify_stores() {
            self.diagnostics.push(Diagnostic::cache(
                Code::ChecksumMismatch,
                format!("snapshot failed verification, deleted: {e}"),
            ));
            self.cache.clear()?;
            return Err(e);
        }

        self.nd = snapshot.restore();
        self.index = QueryIndex::build(&self.nd);
        self.data_sources = snapshot.data_sources.clone();
        self.file_metadata = snapshot.file_metadata.clone();
        self.nasr_info = snapshot.nasr_info;
        self.timestamp_ms = Some(snapshot.timestamp_ms);
        info!(
            "loaded snapshot {} ({} airports, {} fixes)",
            snapshot.id,
            self.nd.counts().airports,
            self.nd.counts().fixes
        );
        Ok(())
    }

    async fn load_from_network(
        &mut self,
        client: &FetchClient,
        progress: &mut dyn FnMut(LoadProgress),
    ) -> Result<()> {
        let auth_tag = self.sources.authoritative.tag();
        let fallback_tag = self.sources.fallback.tag();
        let mora_tag = self.sources.mora.tag();

        progress(LoadProgress::SourceStarted(auth_tag));
        progress(LoadProgress::SourceStarted(fallback_tag));
        progress(LoadProgress::SourceStarted(mora_tag));

        // join-all with settled semantics: every outcome is observed
        let (authoritative, fallback, mora) = tokio::join!(
            self.sources.authoritative.load(client),
            self.sources.fallback.load(client),
            self.sources.mora.load(client),
        );

        let mut settle = |outcome: Result<LoadedSource>, tag: SourceTag| match outcome {
            Ok(loaded) => {
                progress(LoadProgress::SourceLoaded {
                    tag,
                    records: loaded.data.record_count(),
                    elapsed_ms: loaded.elapsed_ms,
                });
                self.diagnostics.extend(loaded.diagnostics.iter().cloned());
                Some(loaded)
            }
            Err(e) => {
                warn!("source {} failed: {e}", tag.as_str());
                self.diagnostics.push(
                    Diagnostic::data(Code::SourceFetch, format!("{} unavailable: {e}", tag.as_str())),
                );
                progress(LoadProgress::SourceFailed {
                    tag,
                    message: e.to_string(),
                });
                None
            }
        };

        let authoritative = settle(authoritative, auth_tag);
        let fallback = settle(fallback, fallback_tag);
        let mora = settle(mora, mora_tag);

        if authoritative.is_none() && fallback.is_none() {
            if self.nd.is_empty() {
                return Err(Error::NoData(
                    "both aviation sources unavailable on cold start".to_string(),
                ));
            }
            // the (possibly expired) cached stores remain in use
            warn!("both sources unavailable, keeping cached stores");
            return Ok(());
        }

        if authoritative.is_none() {
            self.diagnostics.push(Diagnostic::data(
                Code::Degraded,
                "authoritative source unavailable, running fallback-only",
            ));
        }

        let loaded: Vec<LoadedSource> = [authoritative, fallback, mora]
            .into_iter()
            .flatten()
            .collect();

        self.install(loaded, progress)
    }

    /// Merges loaded sources, rebuilds the indexes and writes the snapshot.
    fn install(
        &mut self,
        loaded: Vec<LoadedSource>,
        progress: &mut dyn FnMut(LoadProgress),
    ) -> Result<()> {
        let mut nd = NavigationData::new();
        let mut raw_bundle: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        let mut file_metadata: BTreeMap<String, FileMeta> = BTreeMap::new();
        let mut data_sources = Vec::new();
        let mut nasr_info = None;

        for source in &loaded {
            data_sources.push(source.tag);
            merge(&mut nd, &source.data);
            if source.data.validity.is_some() {
                nasr_info = source.data.validity;
            }

            for (part_id, bytes) in &source.raw.parts {
                let key = format!("{}/{}", source.tag.as_str(), part_id);
                let records = bytes.split(|&b| b == b'\n').count().saturating_sub(2);
                file_metadata.insert(
                    key.clone(),
                    FileMeta {
                        records,
                        bytes: bytes.len(),
                        load_ms: source.elapsed_ms,
                    },
                );
                let stored = if self.compress_raw {
                    cache::compress(bytes)?
                } else {
                    bytes.clone()
                };
                raw_bundle.insert(key, stored);
            }
        }

        let timestamp_ms = Utc::now().timestamp_millis();
        let mut snapshot = Snapshot::from_stores(
            &nd,
            data_sources.clone(),
            file_metadata.clone(),
            nasr_info,
            self.compress_raw,
            timestamp_ms,
        );
        // checksums are sealed before the write transaction opens
        snapshot.seal(&raw_bundle)?;
        let payload_bytes = self.cache.write(&snapshot, &raw_bundle)?;
        progress(LoadProgress::SnapshotWritten { payload_bytes });

        self.index = QueryIndex::build(&nd);
        self.nd = nd;
        self.data_sources = data_sources;
        self.file_metadata = file_metadata;
        self.nasr_info = nasr_info;
        self.timestamp_ms = Some(timestamp_ms);

        let counts = self.nd.counts();
        info!(
            "repository ready: {} airports, {} navaids, {} fixes, {} airways, {} procedures, {} MORA cells",
            counts.airports,
            counts.navaids,
            counts.fixes,
            counts.airways,
            counts.procedures,
            counts.mora_cells
        );
        Ok(())
    }

    /// Re-parses the retained raw source bytes with the current parser code
    /// and rewrites the snapshot.
    ///
    /// This is the only path that decompresses the raw bundle; its checksum
    /// is verified here and nowhere else.
    pub fn reindex(&mut self, progress: &mut dyn FnMut(LoadProgress)) -> Result<()> {
        self.diagnostics.clear();

        let snapshot = self.cache.read()?;
        let stored = self.cache.read_raw()?;
        if stored.is_empty() {
            return Err(Error::MissingRawSource);
        }

        if let Err(e) = snapshot.verify_raw(&stored) {
            self.diagnostics.push(Diagnostic::cache(
                Code::RawChecksumMismatch,
                "raw source bundle failed verification, discarded; network reload required",
            ));
            self.cache.clear()?;
            return Err(e);
        }

        let mut loaded = Vec::new();
        for source in [
            &self.sources.authoritative,
            &self.sources.fallback,
            &self.sources.mora,
        ] {
            let tag = source.tag();
            let prefix = format!("{}/", tag.as_str());
            let mut parts = BTreeMap::new();
            for (key, bytes) in &stored {
                if let Some(part_id) = key.strip_prefix(&prefix) {
                    let bytes = if snapshot.compressed {
                        cache::decompress(bytes)?
                    } else {
                        bytes.clone()
                    };
                    parts.insert(part_id.to_string(), bytes);
                }
            }
            if parts.is_empty() {
                continue;
            }

            let raw = RawSource { parts };
            let data = source.parse(&raw)?;
            let diagnostics = source.validate(&data);
            let data = source.transform(data);
            self.diagnostics.extend(diagnostics.iter().cloned());
            loaded.push(LoadedSource {
                tag,
                raw,
                data,
                diagnostics,
                elapsed_ms: 0,
            });
        }

        info!("reindexing {} sources from raw bundle", loaded.len());
        self.install(loaded, progress)
    }

    /// Empties the stores and the persistent cache.
    pub fn clear(&mut self) -> Result<()> {
        self.nd.clear();
        self.index = QueryIndex::default();
        self.data_sources.clear();
        self.file_metadata.clear();
        self.nasr_info = None;
        self.timestamp_ms = None;
        self.diagnostics.clear();
        self.cache.clear()
    }

    /// True when the snapshot's validity window (or the 28-day fallback) has
    /// lapsed at `today`.
    fn snapshot_expired(&self, today: NaiveDate) -> bool {
        if let Some(validity) = &self.nasr_info {
            return today > validity.expiry;
        }
        match self.timestamp_ms {
            Some(ts) => {
                let age_days = (Utc::now().timestamp_millis() - ts) / 86_400_000;
                age_days >= FALLBACK_VALIDITY_DAYS
            }
            None => true,
        }
    }
}

/// Applies one source's collections to the stores, never overriding an
/// identifier an earlier source claimed.
fn merge(nd: &mut NavigationData, data: &SourceData) {
    for arpt in &data.airports {
        nd.add_airport(arpt.clone());
    }
    for navaid in &data.navaids {
        nd.add_navaid(navaid.clone());
    }
    for fix in &data.fixes {
        nd.add_fix(fix.clone());
    }
    for airway in &data.airways {
        nd.add_airway(airway.clone());
    }
    for proc in &data.procedures {
        nd.add_procedure(proc.clone());
    }
    for (airport, freq) in &data.frequencies {
        nd.add_frequency(airport.clone(), freq.clone());
    }
    for (airport, rwy) in &data.runways {
        nd.add_runway(airport.clone(), rwy.clone());
    }
    for (airport, class) in &data.airspaces {
        nd.add_airspace(airport.clone(), class.clone());
    }
    for cell in &data.mora {
        nd.add_mora(*cell);
    }
}
