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

use thiserror::Error;

/// Fatal errors.
///
/// Planning is non-fatal by default: unknown idents, airway slicing problems
/// or per-leg calculation failures surface as [diagnostics] attached to the
/// plan. Only conditions that make a plan or a repository impossible to
/// produce end up here.
///
/// [diagnostics]: crate::diag::Diagnostic
#[derive(Error, Debug)]
pub enum Error {
    /// Both aviation data sources failed on a cold start and no snapshot was
    /// available to fall back to.
    #[error("no aviation data available: {0}")]
    NoData(String),

    /// The persistent snapshot is unusable and could not be recovered.
    #[error("cache corrupted beyond repair: {0}")]
    CacheCorrupted(String),

    /// The caller-supplied planning options contradict each other.
    #[error("inconsistent planning options: {0}")]
    InconsistentOptions(String),

    /// No snapshot has been written yet.
    #[error("no snapshot in cache")]
    NoSnapshot,

    /// The snapshot on disk was written by an unknown schema version.
    #[error("snapshot version {0} is not supported")]
    UnknownSnapshotVersion(u32),

    /// A parsed store's SHA-256 does not match the stored checksum map.
    #[error("checksum mismatch for {0}")]
    ChecksumMismatch(String),

    /// A reindex was requested but the snapshot retains no raw source bytes.
    #[error("no raw source retained for reindex")]
    MissingRawSource,

    /// A source's record layout could not be parsed.
    #[error("source parse error: {0}")]
    SourceParse(String),

    #[error("fetch error: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("storage migration error: {0}")]
    Migration(#[from] rusqlite_migration::Error),

    #[error("snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
