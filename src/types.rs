/**
 * MovieReco
 * Copyright (C) 2026 The MovieReco developers
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use fnv::FnvHashMap;
use sprs::CsMat;

pub type UserId = i64;
pub type ItemId = i64;

/// Rows are items, columns are users.
pub type SparseMatrix = CsMat<f64>;

/// Reserved user identifier for the synthetic profile of an anonymous session.
pub const GHOST_USER: UserId = -1;

/// Rating assigned to every title picked for a synthetic profile.
pub const MAX_RATING: f64 = 5.0;

/// A single observed rating of an item by a user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user: UserId,
    pub item: ItemId,
    pub rating: f64,
}

impl Rating {
    pub fn new(user: UserId, item: ItemId, rating: f64) -> Self {
        Rating { user, item, rating }
    }
}

impl From<(UserId, ItemId, f64)> for Rating {
    fn from((user, item, rating): (UserId, ItemId, f64)) -> Self {
        Rating { user, item, rating }
    }
}

/// Dense index assignment for a set of identifiers. Indices follow the ascending order of the
/// distinct identifiers, so the same set of identifiers always yields the same mapping. The
/// forward and inverse direction are built together and never change afterwards.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IdMapping {
    index_by_id: FnvHashMap<i64, usize>,
    ids: Vec<i64>,
}

impl IdMapping {

    pub fn from_ids<I>(ids: I) -> Self
        where I: IntoIterator<Item = i64> {

        let mut ids: Vec<i64> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();

        let mut index_by_id: FnvHashMap<i64, usize> =
            FnvHashMap::with_capacity_and_hasher(ids.len(), Default::default());

        for (index, id) in ids.iter().enumerate() {
            index_by_id.insert(*id, index);
        }

        IdMapping { index_by_id, ids }
    }

    pub fn index_of(&self, id: i64) -> Option<usize> {
        self.index_by_id.get(&id).cloned()
    }

    pub fn id_at(&self, index: usize) -> Option<i64> {
        self.ids.get(index).cloned()
    }

    /// Identifiers in index order.
    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
