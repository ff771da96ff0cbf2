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

use serde::{Deserialize, Serialize};

/// A named corridor of fixes, traversable in either direction.
///
/// Each fix identifier appears at most once in the sequence; the expander
/// slices between two member fixes by index.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Airway {
    pub ident: String,
    pub fixes: Vec<String>,
}

impl Airway {
    /// Index of a fix on the airway.
    pub fn position_of(&self, ident: &str) -> Option<usize> {
        self.fixes.iter().position(|f| f == ident)
    }

    /// The inclusive fix sequence between two member fixes, in traversal
    /// order. Returns `None` if either endpoint is not on the airway.
    ///
    /// Equal endpoints yield a single-element sequence.
    pub fn span(&self, from: &str, to: &str) -> Option<Vec<String>> {
        let f = self.position_of(from)?;
        let t = self.position_of(to)?;

        if f <= t {
            Some(self.fixes[f..=t].to_vec())
        } else {
            let mut seq = self.fixes[t..=f].to_vec();
            seq.reverse();
            Some(seq)
        }
    }
}
