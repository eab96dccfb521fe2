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

#[macro_use]
extern crate serde_derive;

mod error;
mod types;
mod matrix;
mod similarity;
mod model;
pub mod catalog;
pub mod io;
pub mod profile;
pub mod recommend;

pub use error::{RecoError, Result};
pub use types::{IdMapping, ItemId, Rating, SparseMatrix, UserId, GHOST_USER, MAX_RATING};
pub use matrix::RatingMatrix;
pub use similarity::{Metric, Neighbor, SimilarityIndex};
pub use model::{FreshBuild, Model, ModelSource, SnapshotFile};
pub use catalog::Catalog;
pub use profile::{recommend_for_titles, SyntheticProfile};
pub use recommend::{
    recommend_for_all_users, recommend_for_items, recommend_for_user, RecommendOptions,
};
