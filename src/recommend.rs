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

use std::sync::Mutex;
use std::time::Instant;

use fnv::FnvHashSet;
use scoped_pool::Pool;
use tracing::{debug, info};

use crate::error::{RecoError, Result};
use crate::model::Model;
use crate::types::{ItemId, Rating, UserId};

/// Per-request knobs for the aggregator. Passed explicitly into every entry point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendOptions {
    /// Number of neighbors to retrieve per seed item.
    pub k: usize,
    /// Number of top-rated items used as seeds in profile mode.
    pub num_seeds: usize,
    /// Truncate the final list to this length.
    pub limit: Option<usize>,
}

impl Default for RecommendOptions {
    fn default() -> Self {
        RecommendOptions { k: 10, num_seeds: 3, limit: None }
    }
}

/// Collects identifiers in the order they are first seen, skipping repetitions.
struct OrderedUnion {
    seen: FnvHashSet<ItemId>,
    items: Vec<ItemId>,
}

impl OrderedUnion {

    fn new() -> Self {
        OrderedUnion { seen: FnvHashSet::default(), items: Vec::new() }
    }

    fn extend<I: IntoIterator<Item = ItemId>>(&mut self, items: I) {
        for item in items {
            if self.seen.insert(item) {
                self.items.push(item);
            }
        }
    }

    fn into_vec(self) -> Vec<ItemId> {
        self.items
    }
}

fn neighbors_of_seeds(model: &Model, seeds: &[ItemId], k: usize) -> Result<OrderedUnion> {
    let mut union = OrderedUnion::new();

    for seed in seeds {
        let similar = model.index.similar_items(&model.matrix, *seed, k)?;
        debug!("Seed item {} contributed {:?}", seed, similar);
        union.extend(similar);
    }

    Ok(union)
}

fn truncate(mut items: Vec<ItemId>, limit: Option<usize>) -> Vec<ItemId> {
    if let Some(limit) = limit {
        items.truncate(limit);
    }
    items
}

/// Seed-list mode: the union of the `k` nearest neighbors of every seed item, in first-seen
/// order. Seeds are not filtered out of the result and can show up as neighbors of each other.
pub fn recommend_for_items(
    model: &Model,
    seeds: &[ItemId],
    options: &RecommendOptions,
) -> Result<Vec<ItemId>> {

    let union = neighbors_of_seeds(model, seeds, options.k)?;

    Ok(truncate(union.into_vec(), options.limit))
}

/// The `num_seeds` highest rated items of a user. Ties keep the order of the ratings table.
pub fn top_rated_items(ratings: &[Rating], user: UserId, num_seeds: usize) -> Vec<ItemId> {
    let mut rated_by_user: Vec<&Rating> = ratings.iter()
        .filter(|rating| rating.user == user)
        .collect();

    // Stable sort, descending by rating
    rated_by_user.sort_by(|a, b| b.rating.partial_cmp(&a.rating)
        .unwrap_or(std::cmp::Ordering::Equal));

    rated_by_user.into_iter()
        .take(num_seeds)
        .map(|rating| rating.item)
        .collect()
}

/// Profile mode: uses the user's top rated items as seeds, unions their neighbors and removes
/// the seeds themselves from the result.
pub fn recommend_for_user(
    model: &Model,
    ratings: &[Rating],
    user: UserId,
    options: &RecommendOptions,
) -> Result<Vec<ItemId>> {

    model.matrix.user_index(user)?;

    let seeds = top_rated_items(ratings, user, options.num_seeds);
    let union = neighbors_of_seeds(model, &seeds, options.k)?;

    let recommended: Vec<ItemId> = union.into_vec()
        .into_iter()
        .filter(|item| !seeds.contains(item))
        .collect();

    debug!("Recommending {} items to user {} from seeds {:?}", recommended.len(), user, seeds);

    Ok(truncate(recommended, options.limit))
}

/// Profile-mode recommendations for every user of the model, computed on `pool_size` threads.
/// The result is ordered by user index. The model is shared read-only between the workers.
pub fn recommend_for_all_users(
    model: &Model,
    ratings: &[Rating],
    options: &RecommendOptions,
    pool_size: usize,
) -> Result<Vec<(UserId, Vec<ItemId>)>> {

    let start = Instant::now();
    let pool = Pool::new(pool_size.max(1));

    let users = model.matrix.users().ids();

    let mut recommendations: Vec<Mutex<Option<Result<Vec<ItemId>>>>> =
        Vec::with_capacity(users.len());

    for _ in 0..users.len() {
        recommendations.push(Mutex::new(None));
    }

    pool.scoped(|scope| {
        for (user, slot) in users.iter().zip(recommendations.iter()) {
            scope.execute(move || {
                let recommended = recommend_for_user(model, ratings, *user, options);
                let mut slot = slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                *slot = Some(recommended);
            });
        }
    });

    pool.shutdown();

    info!(
        "Computed recommendations for {} users in {}ms",
        users.len(),
        start.elapsed().as_millis(),
    );

    users.iter()
        .zip(recommendations.into_iter())
        .map(|(user, slot)| Ok((*user, take_slot(*user, slot)?)))
        .collect()
}

/// The result a worker left for a user. An empty slot means the worker never finished.
fn take_slot(user: UserId, slot: Mutex<Option<Result<Vec<ItemId>>>>) -> Result<Vec<ItemId>> {
    slot.into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .unwrap_or(Err(RecoError::WorkerFailed(user)))
}
