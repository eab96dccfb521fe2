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

use std::time::Instant;

use sprs::{CsVecView, TriMat};
use tracing::info;

use crate::error::{RecoError, Result};
use crate::types::{IdMapping, ItemId, Rating, SparseMatrix, UserId};

/// Sparse item-by-user rating matrix together with the mappings between the original
/// identifiers and the row and column indices.
#[derive(Debug, Clone)]
pub struct RatingMatrix {
    ratings: SparseMatrix,
    users: IdMapping,
    items: IdMapping,
}

impl RatingMatrix {

    /// Builds the matrix from a sequence of observations. Every observation contributes one
    /// triplet, repeated (item, user) pairs are summed up when the triplets are compressed.
    /// An empty sequence results in a 0x0 matrix.
    pub fn build(observations: &[Rating]) -> Self {

        let start = Instant::now();

        let users = IdMapping::from_ids(observations.iter().map(|observation| observation.user));
        let items = IdMapping::from_ids(observations.iter().map(|observation| observation.item));

        let mut triplets = TriMat::with_capacity((items.len(), users.len()), observations.len());

        for observation in observations.iter() {
            // Both mappings were built from these very observations
            if let (Some(item_index), Some(user_index)) =
                (items.index_of(observation.item), users.index_of(observation.user)) {
                triplets.add_triplet(item_index, user_index, observation.rating);
            }
        }

        let ratings: SparseMatrix = triplets.to_csr();

        info!(
            "Built rating matrix for {} items and {} users from {} ratings in {}ms",
            items.len(),
            users.len(),
            observations.len(),
            start.elapsed().as_millis(),
        );

        RatingMatrix { ratings, users, items }
    }

    /// Reassembles a matrix from its parts, used when restoring a snapshot.
    pub(crate) fn from_parts(ratings: SparseMatrix, users: IdMapping, items: IdMapping) -> Self {
        RatingMatrix { ratings, users, items }
    }

    pub fn num_items(&self) -> usize {
        self.items.len()
    }

    pub fn num_users(&self) -> usize {
        self.users.len()
    }

    /// Number of stored (non-implicit) cells.
    pub fn num_ratings(&self) -> usize {
        self.ratings.nnz()
    }

    pub fn users(&self) -> &IdMapping {
        &self.users
    }

    pub fn items(&self) -> &IdMapping {
        &self.items
    }

    pub fn ratings(&self) -> &SparseMatrix {
        &self.ratings
    }

    pub fn item_index(&self, item: ItemId) -> Result<usize> {
        self.items.index_of(item).ok_or(RecoError::UnknownItem(item))
    }

    pub fn user_index(&self, user: UserId) -> Result<usize> {
        self.users.index_of(user).ok_or(RecoError::UnknownUser(user))
    }

    pub fn item_id(&self, item_index: usize) -> Result<ItemId> {
        self.items.id_at(item_index).ok_or(RecoError::UnknownItemIndex(item_index))
    }

    /// The ratings of an item as a sparse vector in user space.
    pub fn item_row(&self, item_index: usize) -> Option<CsVecView<f64>> {
        self.ratings.outer_view(item_index)
    }

    /// The rating a user gave an item, zero if there is none.
    pub fn rating(&self, item: ItemId, user: UserId) -> Result<f64> {
        let item_index = self.item_index(item)?;
        let user_index = self.user_index(user)?;

        Ok(self.ratings.get(item_index, user_index).cloned().unwrap_or(0.0))
    }

    /// Dense copy of an item's ratings, ordered by user index.
    pub fn item_vector(&self, item: ItemId) -> Result<Vec<f64>> {
        let item_index = self.item_index(item)?;
        let mut dense = vec![0.0; self.num_users()];

        if let Some(row) = self.item_row(item_index) {
            for (user_index, value) in row.indices().iter().zip(row.data().iter()) {
                dense[*user_index] = *value;
            }
        }

        Ok(dense)
    }
}

#[cfg(test)]
mod tests {

    use crate::error::RecoError;
    use crate::matrix::RatingMatrix;
    use crate::types::Rating;

    fn ratings(triples: &[(i64, i64, f64)]) -> Vec<Rating> {
        triples.iter().map(|triple| Rating::from(*triple)).collect()
    }

    #[test]
    fn items_by_users() {
        let observations = ratings(&[
            (1, 10, 5.0), (2, 10, 4.0), (1, 20, 3.0), (2, 20, 5.0), (1, 30, 1.0)
        ]);

        let matrix = RatingMatrix::build(&observations);

        assert_eq!(matrix.num_items(), 3);
        assert_eq!(matrix.num_users(), 2);
        assert_eq!(matrix.ratings().shape(), (3, 2));
        assert_eq!(matrix.num_ratings(), 5);

        assert_eq!(matrix.item_vector(10).unwrap(), vec![5.0, 4.0]);
        assert_eq!(matrix.item_vector(20).unwrap(), vec![3.0, 5.0]);
        assert_eq!(matrix.item_vector(30).unwrap(), vec![1.0, 0.0]);
    }

    #[test]
    fn mappings_are_inverse() {
        let observations = ratings(&[
            (7, 318, 4.5), (3, 296, 3.0), (-1, 318, 5.0), (3, 2571, 2.0), (9, 1, 1.5)
        ]);

        let matrix = RatingMatrix::build(&observations);

        for index in 0..matrix.num_items() {
            let item = matrix.item_id(index).unwrap();
            assert_eq!(matrix.item_index(item).unwrap(), index);
        }

        for index in 0..matrix.num_users() {
            let user = matrix.users().id_at(index).unwrap();
            assert_eq!(matrix.user_index(user).unwrap(), index);
        }

        assert_eq!(matrix.users().ids(), &[-1, 3, 7, 9]);
        assert_eq!(matrix.items().ids(), &[1, 296, 318, 2571]);
    }

    #[test]
    fn mapping_independent_of_arrival_order() {
        let observations = ratings(&[
            (5, 50, 2.0), (1, 10, 4.0), (3, 30, 3.5), (1, 50, 1.0)
        ]);

        let mut reversed = observations.clone();
        reversed.reverse();

        let matrix = RatingMatrix::build(&observations);
        let matrix_of_reversed = RatingMatrix::build(&reversed);

        assert_eq!(matrix.users(), matrix_of_reversed.users());
        assert_eq!(matrix.items(), matrix_of_reversed.items());
        assert_eq!(matrix.item_vector(50).unwrap(), matrix_of_reversed.item_vector(50).unwrap());
    }

    #[test]
    fn repeated_observations_are_summed() {
        let observations = ratings(&[(1, 10, 2.0), (1, 10, 1.5), (2, 10, 4.0)]);

        let matrix = RatingMatrix::build(&observations);

        assert_eq!(matrix.num_items(), 1);
        assert_eq!(matrix.num_users(), 2);
        assert_eq!(matrix.rating(10, 1).unwrap(), 3.5);
        assert_eq!(matrix.rating(10, 2).unwrap(), 4.0);
    }

    #[test]
    fn empty_input_gives_empty_matrix() {
        let matrix = RatingMatrix::build(&[]);

        assert_eq!(matrix.num_items(), 0);
        assert_eq!(matrix.num_users(), 0);
        assert_eq!(matrix.num_ratings(), 0);
        assert!(matrix.items().is_empty());
        assert!(matrix.users().is_empty());
    }

    #[test]
    fn unknown_identifiers() {
        let matrix = RatingMatrix::build(&ratings(&[(1, 10, 5.0)]));

        match matrix.item_index(99) {
            Err(RecoError::UnknownItem(99)) => {},
            other => panic!("unexpected result {:?}", other),
        }

        match matrix.rating(10, 42) {
            Err(RecoError::UnknownUser(42)) => {},
            other => panic!("unexpected result {:?}", other),
        }

        assert_eq!(matrix.rating(10, 1).unwrap(), 5.0);
    }
}
