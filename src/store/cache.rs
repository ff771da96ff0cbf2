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

//! Persistent snapshot cache.
//!
//! One logical record per versioned snapshot: every merged entity store as
//! an ordered key/value array, load metadata, the authoritative validity
//! window, SHA-256 checksums per store, and the optionally gzip'd raw source
//! blobs in a sibling table. Writes are a single sqlite transaction, so
//! readers observe either the old snapshot or the new one, never a mix.
//!
//! Parsed-store checksums are verified on every load; the raw bundle's
//! checksum only when a reindex actually needs the bytes, which keeps cold
//! starts from hashing megabytes of compressed CSV.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};
use rusqlite_migration::{Migrations, M};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::source::ValidityWindow;
use crate::error::{Error, Result};
use crate::nd::{
    Airport, AirspaceClass, Airway, Fix, Frequency, MoraCell, NavigationData, Navaid, Procedure,
    Runway, SourceTag,
};

/// Current snapshot schema version.
pub const SNAPSHOT_VERSION: u32 = 4;
/// Oldest version still readable; anything older forces a full reload.
pub const MIN_SUPPORTED_VERSION: u32 = 3;
/// Cache lifetime when the authoritative source carries no expiry date.
pub const FALLBACK_VALIDITY_DAYS: i64 = 28;

pub fn snapshot_id(version: u32) -> String {
    format!("flightdata_cache_v{version}")
}

/// Per source-part load metadata.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct FileMeta {
    pub records: usize,
    pub bytes: usize,
    pub load_ms: u64,
}

/// The single snapshot record.
///
/// Entity stores are ordered key/value arrays — the wire format existing
/// snapshots use — and are materialized back into hash maps on load.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,
    pub version: u32,
    pub timestamp_ms: i64,
    pub airports: Vec<(String, Airport)>,
    pub navaids: Vec<(String, Navaid)>,
    pub fixes: Vec<(String, Fix)>,
    pub airways: Vec<(String, Airway)>,
    /// Keyed by computer code; the name key is rebuilt on load.
    pub procedures: Vec<(String, Procedure)>,
    pub frequencies: Vec<(String, Vec<Frequency>)>,
    pub runways: Vec<(String, Vec<Runway>)>,
    pub airspaces: Vec<(String, AirspaceClass)>,
    pub mora: Vec<((i16, i16), MoraCell)>,
    pub data_sources: Vec<SourceTag>,
    #[serde(default)]
    pub file_metadata: BTreeMap<String, FileMeta>,
    pub nasr_info: Option<ValidityWindow>,
    pub compressed: bool,
    pub checksums: BTreeMap<String, String>,
}

fn sorted_kv<V: Clone>(map: &std::collections::HashMap<String, V>) -> Vec<(String, V)> {
    let mut entries: Vec<(String, V)> = map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    entries
}

fn sorted_kv_rc<V: Clone>(map: &std::collections::HashMap<String, std::rc::Rc<V>>) -> Vec<(String, V)> {
    let mut entries: Vec<(String, V)> = map
        .iter()
        .map(|(k, v)| (k.clone(), (**v).clone()))
        .collect();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    entries
}

fn store_checksum<T: Serialize>(value: &T) -> Result<String> {
    Ok(sha256_hex(&serde_json::to_vec(value)?))
}

impl Snapshot {
    /// Builds the record from the merged stores. Checksums are not yet
    /// computed; call [`seal`](Self::seal) before writing.
    pub fn from_stores(
        nd: &NavigationData,
        data_sources: Vec<SourceTag>,
        file_metadata: BTreeMap<String, FileMeta>,
        nasr_info: Option<ValidityWindow>,
        compressed: bool,
        timestamp_ms: i64,
    ) -> Self {
        let mut procedures: Vec<(String, Procedure)> = nd
            .procedures
            .iter()
            .filter(|(key, proc)| **key == proc.computer_code)
            .map(|(key, proc)| (key.clone(), (**proc).clone()))
            .collect();
        procedures.sort_by(|(a, _), (b, _)| a.cmp(b));

        let mut mora: Vec<((i16, i16), MoraCell)> =
            nd.mora.iter().map(|(k, v)| (*k, *v)).collect();
        mora.sort_by_key(|(k, _)| *k);

        Self {
            id: snapshot_id(SNAPSHOT_VERSION),
            version: SNAPSHOT_VERSION,
            timestamp_ms,
            airports: sorted_kv_rc(&nd.airports),
            navaids: sorted_kv_rc(&nd.navaids),
            fixes: sorted_kv_rc(&nd.fixes),
            airways: sorted_kv_rc(&nd.airways),
            procedures,
            frequencies: sorted_kv(&nd.frequencies),
            runways: sorted_kv(&nd.runways),
            airspaces: sorted_kv(&nd.airspaces),
            mora,
            data_sources,
            file_metadata,
            nasr_info,
            compressed,
            checksums: BTreeMap::new(),
        }
    }

    /// Computes the checksum map over every parsed store and the raw bundle
    /// as it will be written (compressed bytes hash as stored).
    pub fn seal(&mut self, raw: &BTreeMap<String, Vec<u8>>) -> Result<()> {
        let mut checksums = BTreeMap::new();
        checksums.insert("airports".to_string(), store_checksum(&self.airports)?);
        checksums.insert("navaids".to_string(), store_checksum(&self.navaids)?);
        checksums.insert("fixes".to_string(), store_checksum(&self.fixes)?);
        checksums.insert("airways".to_string(), store_checksum(&self.airways)?);
        checksums.insert("procedures".to_string(), store_checksum(&self.procedures)?);
        checksums.insert(
            "frequencies".to_string(),
            store_checksum(&self.frequencies)?,
        );
        checksums.insert("runways".to_string(), store_checksum(&self.runways)?);
        checksums.insert("airspaces".to_string(), store_checksum(&self.airspaces)?);
        checksums.insert("mora".to_string(), store_checksum(&self.mora)?);
        checksums.insert("raw_sources".to_string(), raw_checksum(raw));
        self.checksums = checksums;
        Ok(())
    }

    /// Verifies every parsed store against the stored checksum map.
    pub fn verify_stores(&self) -> Result<()> {
        let verify = |name: &str, actual: String| -> Result<()> {
            match self.checksums.get(name) {
                Some(expected) if *expected == actual => Ok(()),
                _ => Err(Error::ChecksumMismatch(name.to_string())),
            }
        };
        verify("airports", store_checksum(&self.airports)?)?;
        verify("navaids", store_checksum(&self.navaids)?)?;
        verify("fixes", store_checksum(&self.fixes)?)?;
        verify("airways", store_checksum(&self.airways)?)?;
        verify("procedures", store_checksum(&self.procedures)?)?;
        verify("frequencies", store_checksum(&self.frequencies)?)?;
        verify("runways", store_checksum(&self.runways)?)?;
        verify("airspaces", store_checksum(&self.airspaces)?)?;
        verify("mora", store_checksum(&self.mora)?)?;
        Ok(())
    }

    /// Verifies the raw bundle; called only when a reindex needs the bytes.
    pub fn verify_raw(&self, raw: &BTreeMap<String, Vec<u8>>) -> Result<()> {
        match self.checksums.get("raw_sources") {
            Some(expected) if *expected == raw_checksum(raw) => Ok(()),
            _ => Err(Error::ChecksumMismatch("raw_sources".to_string())),
        }
    }

    /// Materializes the ordered arrays back into hash-map stores.
    pub fn restore(&self) -> NavigationData {
        let mut nd = NavigationData::new();
        for (_, arpt) in &self.airports {
            nd.add_airport(arpt.clone());
        }
        for (_, navaid) in &self.navaids {
            nd.add_navaid(navaid.clone());
        }
        for (_, fix) in &self.fixes {
            nd.add_fix(fix.clone());
        }
        for (_, airway) in &self.airways {
            nd.add_airway(airway.clone());
        }
        for (_, proc) in &self.procedures {
            nd.add_procedure(proc.clone());
        }
        for (airport, freqs) in &self.frequencies {
            for freq in freqs {
                nd.add_frequency(airport.clone(), freq.clone());
            }
        }
        for (airport, rwys) in &self.runways {
            for rwy in rwys {
                nd.add_runway(airport.clone(), rwy.clone());
            }
        }
        for (airport, class) in &self.airspaces {
            nd.add_airspace(airport.clone(), class.clone());
        }
        for (_, cell) in &self.mora {
            nd.add_mora(*cell);
        }
        nd
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn raw_checksum(raw: &BTreeMap<String, Vec<u8>>) -> String {
    let mut hasher = Sha256::new();
    for (id, bytes) in raw {
        hasher.update(id.as_bytes());
        hasher.update([0u8]);
        hasher.update(bytes);
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

pub fn compress(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

pub fn decompress(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// The sqlite-backed snapshot store.
pub struct Cache {
    conn: Connection,
}

impl Cache {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(mut conn: Connection) -> Result<Self> {
        let migrations = Migrations::new(vec![M::up(
            "CREATE TABLE snapshot (
                id TEXT PRIMARY KEY,
                version INTEGER NOT NULL,
                timestamp_ms INTEGER NOT NULL,
                payload BLOB NOT NULL
            );
            CREATE TABLE raw_part (
                snapshot_id TEXT NOT NULL,
                part_id TEXT NOT NULL,
                bytes BLOB NOT NULL,
                PRIMARY KEY (snapshot_id, part_id)
            );",
        )]);
        migrations.to_latest(&mut conn)?;
        Ok(Self { conn })
    }

    /// Writes the snapshot and its raw bundle in one transaction.
    ///
    /// The previous snapshot is replaced atomically; checksums must already
    /// be sealed into the record.
    pub fn write(&mut self, snapshot: &Snapshot, raw: &BTreeMap<String, Vec<u8>>) -> Result<usize> {
        let payload = serde_json::to_vec(snapshot)?;
        let payload_len = payload.len();

        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM snapshot", [])?;
        tx.execute("DELETE FROM raw_part", [])?;
        tx.execute(
            "INSERT INTO snapshot (id, version, timestamp_ms, payload) VALUES (?1, ?2, ?3, ?4)",
            params![snapshot.id, snapshot.version, snapshot.timestamp_ms, payload],
        )?;
        for (part_id, bytes) in raw {
            tx.execute(
                "INSERT INTO raw_part (snapshot_id, part_id, bytes) VALUES (?1, ?2, ?3)",
                params![snapshot.id, part_id, bytes],
            )?;
        }
        tx.commit()?;

        info!(
            "snapshot {} written ({payload_len} bytes payload, {} raw parts)",
            snapshot.id,
            raw.len()
        );
        Ok(payload_len)
    }

    /// Reads the snapshot record.
    ///
    /// Unknown schema versions fail before the payload is even parsed; a
    /// payload that does not parse reports the cache as corrupted.
    pub fn read(&self) -> Result<Snapshot> {
        let row: Option<(u32, Vec<u8>)> = self
            .conn
            .query_row(
                "SELECT version, payload FROM snapshot LIMIT 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let (version, payload) = row.ok_or(Error::NoSnapshot)?;
        if !(MIN_SUPPORTED_VERSION..=SNAPSHOT_VERSION).contains(&version) {
            return Err(Error::UnknownSnapshotVersion(version));
        }

        let snapshot: Snapshot = serde_json::from_slice(&payload)
            .map_err(|e| Error::CacheCorrupted(format!("snapshot payload: {e}")))?;
        debug!("snapshot {} read (version {version})", snapshot.id);
        Ok(snapshot)
    }

    /// Reads the raw source bundle as stored (possibly compressed).
    pub fn read_raw(&self) -> Result<BTreeMap<String, Vec<u8>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT part_id, bytes FROM raw_part ORDER BY part_id")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
        })?;

        let mut parts = BTreeMap::new();
        for row in rows {
            let (part_id, bytes) = row?;
            parts.insert(part_id, bytes);
        }
        Ok(parts)
    }

    pub fn has_snapshot(&self) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM snapshot", [], |row| row.get(0))?;
        Ok(count > 0)
    }

    /// Deletes the snapshot and raw bundle.
    pub fn clear(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM snapshot", [])?;
        tx.execute("DELETE FROM raw_part", [])?;
        tx.commit()?;
        Ok(())
    }

    /// Replaces a byte sequence inside the stored payload, bypassing the
    /// checksum seal. Test hook for corruption scenarios.
    #[cfg(test)]
    pub(crate) fn tamper_payload(&mut self, find: &str, replace: &str) -> Result<()> {
        let payload: Vec<u8> = self
            .conn
            .query_row("SELECT payload FROM snapshot LIMIT 1", [], |row| row.get(0))?;
        let tampered = String::from_utf8_lossy(&payload).replacen(find, replace, 1);
        self.conn.execute(
            "UPDATE snapshot SET payload = ?1",
            params![tampered.into_bytes()],
        )?;
        Ok(())
    }

    /// Overwrites the stored version column. Test hook.
    #[cfg(test)]
    pub(crate) fn tamper_version(&mut self, version: u32) -> Result<()> {
        self.conn
            .execute("UPDATE snapshot SET version = ?1", params![version])?;
        Ok(())
    }

    /// Runs arbitrary SQL against the store. Test hook.
    #[cfg(test)]
    pub(crate) fn execute_sql(&mut self, sql: &str) {
        self.conn.execute(sql, []).expect("test SQL should run");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::source::DataSource;

    fn sample_nd() -> NavigationData {
        let snapshot_source = crate::store::nasr::fixtures::raw();
        let data = crate::store::nasr::NasrSource::default()
            .parse(&snapshot_source)
            .unwrap();

        let mut nd = NavigationData::new();
        for arpt in data.airports {
            nd.add_airport(arpt);
        }
        for navaid in data.navaids {
            nd.add_navaid(navaid);
        }
        for fix in data.fixes {
            nd.add_fix(fix);
        }
        for airway in data.airways {
            nd.add_airway(airway);
        }
        for proc in data.procedures {
            nd.add_procedure(proc);
        }
        nd
    }

    fn sealed_snapshot(nd: &NavigationData) -> (Snapshot, BTreeMap<String, Vec<u8>>) {
        let mut raw = BTreeMap::new();
        raw.insert("nasr/APT_BASE".to_string(), b"raw bytes".to_vec());

        let mut snapshot = Snapshot::from_stores(
            nd,
            vec![SourceTag::Nasr],
            BTreeMap::new(),
            None,
            false,
            1_755_000_000_000,
        );
        snapshot.seal(&raw).unwrap();
        (snapshot, raw)
    }

    #[test]
    fn write_read_round_trip_preserves_stores() {
        let nd = sample_nd();
        let (snapshot, raw) = sealed_snapshot(&nd);

        let mut cache = Cache::open_in_memory().unwrap();
        cache.write(&snapshot, &raw).unwrap();

        let read_back = cache.read().unwrap();
        assert_eq!(read_back, snapshot);
        read_back.verify_stores().unwrap();

        let restored = read_back.restore();
        assert_eq!(restored.counts(), nd.counts());
        assert_eq!(
            restored.airport("KJFK").unwrap(),
            nd.airport("KJFK").unwrap()
        );
        // both procedure keys are rebuilt
        assert!(restored.procedure("CLPRR3").is_some());
        assert!(restored.procedure("KCMH.CLPRR3").is_some());
    }

    #[test]
    fn bit_flip_in_airports_fails_verification() {
        let nd = sample_nd();
        let (snapshot, raw) = sealed_snapshot(&nd);

        let mut cache = Cache::open_in_memory().unwrap();
        cache.write(&snapshot, &raw).unwrap();
        cache.tamper_payload("KJFK", "KJFX").unwrap();

        let tampered = cache.read().unwrap();
        match tampered.verify_stores() {
            Err(Error::ChecksumMismatch(store)) => assert_eq!(store, "airports"),
            other => panic!("expected checksum mismatch, got {other:?}"),
        }
    }

    #[test]
    fn raw_bundle_verification_catches_tampering() {
        let nd = sample_nd();
        let (snapshot, mut raw) = sealed_snapshot(&nd);

        snapshot.verify_raw(&raw).unwrap();
        raw.insert("nasr/APT_BASE".to_string(), b"flipped".to_vec());
        assert!(matches!(
            snapshot.verify_raw(&raw),
            Err(Error::ChecksumMismatch(_))
        ));
    }

    #[test]
    fn unknown_version_is_rejected_before_parsing() {
        let nd = sample_nd();
        let (snapshot, raw) = sealed_snapshot(&nd);

        let mut cache = Cache::open_in_memory().unwrap();
        cache.write(&snapshot, &raw).unwrap();
        cache.tamper_version(99).unwrap();

        assert!(matches!(
            cache.read(),
            Err(Error::UnknownSnapshotVersion(99))
        ));
    }

    #[test]
    fn empty_cache_reports_no_snapshot() {
        let cache = Cache::open_in_memory().unwrap();
        assert!(matches!(cache.read(), Err(Error::NoSnapshot)));
        assert!(!cache.has_snapshot().unwrap());
    }

    #[test]
    fn compression_round_trips() {
        let bytes = nasr_fixture_bytes();
        let packed = compress(&bytes).unwrap();
        assert!(packed.len() < bytes.len());
        assert_eq!(decompress(&packed).unwrap(), bytes);
    }

    fn nasr_fixture_bytes() -> Vec<u8> {
        crate::store::nasr::fixtures::APT_BASE
            .repeat(8)
            .into_bytes()
    }
}
