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

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use sprs::TriMat;
use tracing::info;

use crate::error::{RecoError, Result};
use crate::matrix::RatingMatrix;
use crate::similarity::{Metric, SimilarityIndex};
use crate::types::{IdMapping, Rating, SparseMatrix};

/// A rating matrix together with the similarity index built from it. Both are read-only once
/// fitted, a refresh builds a new model and replaces the old one as a whole.
#[derive(Debug, Clone)]
pub struct Model {
    pub matrix: RatingMatrix,
    pub index: SimilarityIndex,
}

impl Model {

    pub fn fit(ratings: &[Rating], metric: Metric) -> Self {
        let matrix = RatingMatrix::build(ratings);
        let index = SimilarityIndex::build(&matrix, metric);

        Model { matrix, index }
    }

    /// Writes the fitted model as a JSON snapshot.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let snapshot = Snapshot::from(self);
        let writer = BufWriter::new(File::create(path.as_ref())?);
        serde_json::to_writer(writer, &snapshot)?;

        info!(
            "Saved model with {} items and {} users to {}",
            snapshot.item_ids.len(),
            snapshot.user_ids.len(),
            path.as_ref().display(),
        );

        Ok(())
    }

    /// Restores a model from a snapshot written by `save`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let snapshot: Snapshot = serde_json::from_reader(reader)?;

        info!("Loading model snapshot from {}", path.as_ref().display());

        snapshot.into_model()
    }
}

/// Serialized form of a fitted model: the metric, both identifier lists in index order and
/// the stored cells of the matrix.
#[derive(Serialize, Deserialize)]
struct Snapshot {
    metric: Metric,
    user_ids: Vec<i64>,
    item_ids: Vec<i64>,
    cells: Vec<(usize, usize, f64)>,
}

impl<'a> From<&'a Model> for Snapshot {

    fn from(model: &'a Model) -> Self {
        let ratings = model.matrix.ratings();
        let mut cells = Vec::with_capacity(ratings.nnz());

        for (item_index, row) in ratings.outer_iterator().enumerate() {
            for (user_index, value) in row.indices().iter().zip(row.data().iter()) {
                cells.push((item_index, *user_index, *value));
            }
        }

        Snapshot {
            metric: model.index.metric(),
            user_ids: model.matrix.users().ids().to_vec(),
            item_ids: model.matrix.items().ids().to_vec(),
            cells,
        }
    }
}

impl Snapshot {

    fn into_model(self) -> Result<Model> {
        ensure_ascending("user", &self.user_ids)?;
        ensure_ascending("item", &self.item_ids)?;

        let users = IdMapping::from_ids(self.user_ids);
        let items = IdMapping::from_ids(self.item_ids);

        let mut triplets = TriMat::with_capacity((items.len(), users.len()), self.cells.len());

        for (item_index, user_index, value) in self.cells.into_iter() {
            if item_index >= items.len() || user_index >= users.len() {
                return Err(RecoError::CorruptSnapshot(format!(
                    "cell ({}, {}) lies outside of the {}x{} matrix",
                    item_index, user_index, items.len(), users.len()
                )));
            }
            triplets.add_triplet(item_index, user_index, value);
        }

        let ratings: SparseMatrix = triplets.to_csr();
        let matrix = RatingMatrix::from_parts(ratings, users, items);
        let index = SimilarityIndex::build(&matrix, self.metric);

        Ok(Model { matrix, index })
    }
}

/// Stored identifiers are in index order, anything else would attach cells to the wrong ids.
fn ensure_ascending(kind: &str, ids: &[i64]) -> Result<()> {
    match ids.windows(2).position(|pair| pair[0] >= pair[1]) {
        Some(position) => Err(RecoError::CorruptSnapshot(format!(
            "{} ids are not strictly ascending at position {}", kind, position + 1
        ))),
        None => Ok(()),
    }
}

/// Where a fitted model comes from. Callers pick an implementation through their
/// configuration rather than hard-coding file locations.
pub trait ModelSource {
    fn model(&self) -> Result<Model>;
}

/// Fits a new model from a set of ratings.
pub struct FreshBuild<'a> {
    pub ratings: &'a [Rating],
    pub metric: Metric,
}

impl<'a> ModelSource for FreshBuild<'a> {
    fn model(&self) -> Result<Model> {
        Ok(Model::fit(self.ratings, self.metric))
    }
}

/// Loads a previously saved model snapshot.
pub struct SnapshotFile {
    pub path: PathBuf,
}

impl ModelSource for SnapshotFile {
    fn model(&self) -> Result<Model> {
        Model::load(&self.path)
    }
}
