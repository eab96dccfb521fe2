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

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use sprs::CsVecView;
use tracing::{debug, info};

use crate::error::{RecoError, Result};
use crate::matrix::RatingMatrix;
use crate::types::{ItemId, SparseMatrix};

/// Distance between two item vectors in user space. The vectors are the raw ratings, they are
/// neither centered nor normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Cosine,
    Euclidean,
    Manhattan,
}

impl Default for Metric {
    fn default() -> Self {
        Metric::Cosine
    }
}

impl FromStr for Metric {
    type Err = RecoError;

    fn from_str(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "cosine" => Ok(Metric::Cosine),
            "euclidean" => Ok(Metric::Euclidean),
            "manhattan" => Ok(Metric::Manhattan),
            _ => Err(RecoError::UnknownMetric(name.to_string())),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            Metric::Cosine => "cosine",
            Metric::Euclidean => "euclidean",
            Metric::Manhattan => "manhattan",
        };
        write!(f, "{}", name)
    }
}

impl Metric {

    fn distance(&self, a: &CsVecView<f64>, norm_a: f64, b: &CsVecView<f64>, norm_b: f64) -> f64 {
        match *self {
            Metric::Cosine => {
                // A vector without ratings is orthogonal to everything
                if norm_a == 0.0 || norm_b == 0.0 {
                    return 1.0;
                }
                let similarity = sum_over_union(a, b, |x, y| x * y) / (norm_a * norm_b);
                (1.0 - similarity).max(0.0).min(2.0)
            },
            Metric::Euclidean => sum_over_union(a, b, |x, y| (x - y) * (x - y)).sqrt(),
            Metric::Manhattan => sum_over_union(a, b, |x, y| (x - y).abs()),
        }
    }
}

/// Walks the non-zero entries of both vectors in index order and sums up `f(a_i, b_i)`, with
/// zero standing in for missing entries.
fn sum_over_union<F>(a: &CsVecView<f64>, b: &CsVecView<f64>, f: F) -> f64
    where F: Fn(f64, f64) -> f64 {

    let (indices_a, data_a) = (a.indices(), a.data());
    let (indices_b, data_b) = (b.indices(), b.data());

    let mut sum = 0.0;
    let mut pos_a = 0;
    let mut pos_b = 0;

    while pos_a < indices_a.len() && pos_b < indices_b.len() {
        match indices_a[pos_a].cmp(&indices_b[pos_b]) {
            Ordering::Less => {
                sum += f(data_a[pos_a], 0.0);
                pos_a += 1;
            },
            Ordering::Greater => {
                sum += f(0.0, data_b[pos_b]);
                pos_b += 1;
            },
            Ordering::Equal => {
                sum += f(data_a[pos_a], data_b[pos_b]);
                pos_a += 1;
                pos_b += 1;
            },
        }
    }

    for value in &data_a[pos_a..] {
        sum += f(*value, 0.0);
    }

    for value in &data_b[pos_b..] {
        sum += f(0.0, *value);
    }

    sum
}

fn l2_norm(vector: &CsVecView<f64>) -> f64 {
    vector.data().iter().map(|value| value * value).sum::<f64>().sqrt()
}

/// An item found by a nearest-neighbor query, together with its distance to the query.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct Neighbor {
    pub item: usize,
    pub distance: f64,
}

/// Ordering for the max-heap used during top-k selection: the heap's top is the worst
/// candidate, i.e. the one with the largest distance and, among equal distances, the largest
/// item index. There is no total order on floating point numbers, so NaN counts as equal.
fn cmp_by_distance(a: &Neighbor, b: &Neighbor) -> Ordering {
    match a.distance.partial_cmp(&b.distance) {
        Some(Ordering::Equal) | None => a.item.cmp(&b.item),
        Some(ordering) => ordering,
    }
}

impl Eq for Neighbor {}

impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_by_distance(self, other)
    }
}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(cmp_by_distance(self, other))
    }
}

/// Exhaustive nearest-neighbor index over the item rows of a rating matrix. The index holds
/// its own copy of the rows and has to be rebuilt whenever the matrix changes.
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    rows: SparseMatrix,
    norms: Vec<f64>,
    metric: Metric,
}

impl SimilarityIndex {

    pub fn build(matrix: &RatingMatrix, metric: Metric) -> Self {
        let start = Instant::now();

        let rows = matrix.ratings().clone();
        let norms: Vec<f64> = rows.outer_iterator()
            .map(|row| l2_norm(&row))
            .collect();

        info!(
            "Built {} similarity index over {} items in {}ms",
            metric,
            norms.len(),
            start.elapsed().as_millis(),
        );

        SimilarityIndex { rows, norms, metric }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn num_items(&self) -> usize {
        self.rows.rows()
    }

    /// Dimensionality of the item vectors, which is the number of users.
    pub fn dimensions(&self) -> usize {
        self.rows.cols()
    }

    /// The `k` items closest to the given item, in ascending order of distance with ties
    /// broken by item index. The query item itself is never part of the result: we ask the
    /// underlying search for `k + 1` candidates with the query item pinned to the first
    /// position and drop that first result.
    pub fn neighbors(&self, item_index: usize, k: usize) -> Result<Vec<Neighbor>> {

        let query = self.rows.outer_view(item_index)
            .ok_or(RecoError::UnknownItemIndex(item_index))?;

        if k == 0 {
            return Ok(Vec::new());
        }

        let mut candidates = self.top_k(&query, self.norms[item_index], k + 1, Some(item_index));
        candidates.remove(0);

        debug!("Found {} neighbors for item index {}", candidates.len(), item_index);

        Ok(candidates)
    }

    /// The `k` items closest to an arbitrary vector in user space. Nothing is dropped from the
    /// result, an item identical to the query is returned at distance zero.
    pub fn nearest_to_vector(&self, vector: &CsVecView<f64>, k: usize) -> Result<Vec<Neighbor>> {
        if vector.dim() != self.dimensions() {
            return Err(RecoError::ShapeMismatch {
                expected: self.dimensions(),
                actual: vector.dim(),
            });
        }

        Ok(self.top_k(vector, l2_norm(vector), k, None))
    }

    /// Identifier-level variant of `neighbors`: the identifiers of the `k` items most similar
    /// to `item`. The matrix must be the one the index was built from.
    pub fn similar_items(&self, matrix: &RatingMatrix, item: ItemId, k: usize) -> Result<Vec<ItemId>> {
        let item_index = matrix.item_index(item)?;

        self.neighbors(item_index, k)?
            .into_iter()
            .map(|neighbor| matrix.item_id(neighbor.item))
            .collect()
    }

    fn top_k(
        &self,
        query: &CsVecView<f64>,
        query_norm: f64,
        k: usize,
        pinned: Option<usize>,
    ) -> Vec<Neighbor> {

        if k == 0 {
            return Vec::new();
        }

        let mut heap: BinaryHeap<Neighbor> = BinaryHeap::with_capacity(k);

        for (item, row) in self.rows.outer_iterator().enumerate() {

            let distance = if Some(item) == pinned {
                std::f64::NEG_INFINITY
            } else {
                self.metric.distance(query, query_norm, &row, self.norms[item])
            };

            let neighbor = Neighbor { item, distance };

            if heap.len() < k {
                heap.push(neighbor);
            } else if let Some(mut top) = heap.peek_mut() {
                if neighbor < *top {
                    *top = neighbor;
                }
            }
        }

        heap.into_sorted_vec()
    }
}

#[cfg(test)]
mod tests {

    use std::collections::BinaryHeap;
    use std::str::FromStr;

    use sprs::CsVec;

    use crate::error::RecoError;
    use crate::matrix::RatingMatrix;
    use crate::similarity::{Metric, Neighbor, SimilarityIndex};
    use crate::types::Rating;

    fn close_enough_to(value: f64, expected: f64) -> bool {
        (value - expected).abs() < 0.0001
    }

    fn ratings(triples: &[(i64, i64, f64)]) -> Vec<Rating> {
        triples.iter().map(|triple| Rating::from(*triple)).collect()
    }

    fn three_users() -> RatingMatrix {
        RatingMatrix::build(&ratings(&[
            (1, 10, 5.0), (2, 10, 4.0), (1, 20, 3.0), (2, 20, 5.0), (1, 30, 1.0),
            (3, 10, 4.0), (3, 20, 4.0),
        ]))
    }

    #[test]
    fn neighbor_ordering() {
        let near = Neighbor { item: 4, distance: 0.1 };
        let far = Neighbor { item: 1, distance: 0.7 };
        let tied = Neighbor { item: 2, distance: 0.1 };

        assert!(near < far);
        assert!(tied < near);

        let heap: BinaryHeap<Neighbor> = vec![far, near, tied].into_iter().collect();
        let sorted = heap.into_sorted_vec();

        assert_eq!(sorted.iter().map(|n| n.item).collect::<Vec<_>>(), vec![2, 4, 1]);
    }

    #[test]
    fn metric_names() {
        assert_eq!(Metric::from_str("cosine").unwrap(), Metric::Cosine);
        assert_eq!(Metric::from_str("Euclidean").unwrap(), Metric::Euclidean);
        assert_eq!(Metric::from_str("manhattan").unwrap(), Metric::Manhattan);
        assert_eq!(Metric::default(), Metric::Cosine);
        assert_eq!(Metric::Manhattan.to_string(), "manhattan");

        match Metric::from_str("jaccard") {
            Err(RecoError::UnknownMetric(name)) => assert_eq!(name, "jaccard"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn cosine_distances() {
        let matrix = three_users();
        let index = SimilarityIndex::build(&matrix, Metric::Cosine);

        // item 10 = [5, 4, 4], item 20 = [3, 5, 4], item 30 = [1, 0, 0]
        let neighbors = index.neighbors(0, 2).unwrap();

        assert_eq!(neighbors.len(), 2);
        assert_eq!(neighbors[0].item, 1);
        assert!(close_enough_to(neighbors[0].distance, 1.0 - 51.0 / (57.0f64.sqrt() * 50.0f64.sqrt())));
        assert_eq!(neighbors[1].item, 2);
        assert!(close_enough_to(neighbors[1].distance, 1.0 - 5.0 / 57.0f64.sqrt()));
    }

    #[test]
    fn nearest_non_self_item() {
        let matrix = three_users();
        let index = SimilarityIndex::build(&matrix, Metric::Cosine);

        assert_eq!(index.similar_items(&matrix, 10, 1).unwrap(), vec![20]);
        assert_eq!(index.similar_items(&matrix, 30, 1).unwrap(), vec![10]);
    }

    #[test]
    fn query_item_is_never_returned() {
        // Items 1 and 2 have identical rating vectors, so both are at distance zero
        let matrix = RatingMatrix::build(&ratings(&[
            (1, 1, 4.0), (2, 1, 2.0), (1, 2, 4.0), (2, 2, 2.0), (1, 3, 1.0), (3, 4, 5.0),
        ]));

        for metric in &[Metric::Cosine, Metric::Euclidean, Metric::Manhattan] {
            let index = SimilarityIndex::build(&matrix, *metric);

            for item_index in 0..matrix.num_items() {
                for k in 1..6 {
                    let neighbors = index.neighbors(item_index, k).unwrap();
                    assert!(neighbors.iter().all(|neighbor| neighbor.item != item_index));
                    assert_eq!(neighbors.len(), k.min(matrix.num_items() - 1));
                }
            }

            // The twin of item 2 comes first for item 2 and vice versa
            assert_eq!(index.neighbors(1, 1).unwrap()[0].item, 0);
            assert_eq!(index.neighbors(0, 1).unwrap()[0].item, 1);
        }
    }

    #[test]
    fn euclidean_and_manhattan() {
        let matrix = three_users();

        let euclidean = SimilarityIndex::build(&matrix, Metric::Euclidean);
        let neighbors = euclidean.neighbors(2, 2).unwrap();
        // item 30 = [1, 0, 0] vs item 20 = [3, 5, 4] and item 10 = [5, 4, 4]
        assert_eq!(neighbors[0].item, 1);
        assert!(close_enough_to(neighbors[0].distance, 45.0f64.sqrt()));
        assert!(close_enough_to(neighbors[1].distance, 48.0f64.sqrt()));

        let manhattan = SimilarityIndex::build(&matrix, Metric::Manhattan);
        let neighbors = manhattan.neighbors(0, 2).unwrap();
        assert_eq!(neighbors[0].item, 1);
        assert!(close_enough_to(neighbors[0].distance, 3.0));
        assert!(close_enough_to(neighbors[1].distance, 12.0));
    }

    #[test]
    fn unrated_item_is_far_away_under_cosine() {
        let matrix = RatingMatrix::build(&ratings(&[(1, 1, 3.0), (1, 2, 0.0), (2, 1, 1.0)]));
        let index = SimilarityIndex::build(&matrix, Metric::Cosine);

        let neighbors = index.neighbors(1, 1).unwrap();
        assert_eq!(neighbors[0].item, 0);
        assert!(close_enough_to(neighbors[0].distance, 1.0));
    }

    #[test]
    fn zero_neighbors() {
        let matrix = three_users();
        let index = SimilarityIndex::build(&matrix, Metric::Cosine);

        assert!(index.neighbors(0, 0).unwrap().is_empty());
    }

    #[test]
    fn unknown_items() {
        let matrix = three_users();
        let index = SimilarityIndex::build(&matrix, Metric::Cosine);

        match index.neighbors(3, 1) {
            Err(RecoError::UnknownItemIndex(3)) => {},
            other => panic!("unexpected result {:?}", other),
        }

        match index.similar_items(&matrix, 99, 1) {
            Err(RecoError::UnknownItem(99)) => {},
            other => panic!("unexpected result {:?}", other),
        }

        let empty = SimilarityIndex::build(&RatingMatrix::build(&[]), Metric::Cosine);
        assert_eq!(empty.num_items(), 0);
        assert!(empty.neighbors(0, 1).is_err());
    }

    #[test]
    fn query_by_vector() {
        let matrix = three_users();
        let index = SimilarityIndex::build(&matrix, Metric::Cosine);

        let vector = CsVec::new(3, vec![0, 1, 2], vec![5.0, 4.0, 4.0]);
        let nearest = index.nearest_to_vector(&vector.view(), 2).unwrap();

        assert_eq!(nearest[0].item, 0);
        assert!(close_enough_to(nearest[0].distance, 0.0));
        assert_eq!(nearest[1].item, 1);

        let too_short = CsVec::new(2, vec![0], vec![1.0]);
        match index.nearest_to_vector(&too_short.view(), 1) {
            Err(RecoError::ShapeMismatch { expected: 3, actual: 2 }) => {},
            other => panic!("unexpected result {:?}", other),
        }
    }
}
