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
use std::io::prelude::*;
use std::path::Path;

use crate::catalog::{Catalog, Link, Movie};
use crate::error::Result;
use crate::types::{ItemId, Rating};

/// Reads a CSV input file with a header line, as found in the MovieLens datasets.
pub fn csv_reader<P: AsRef<Path>>(path: P) -> Result<csv::Reader<File>> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    Ok(reader)
}

/// Row of a ratings file: `userId,movieId,rating,timestamp`.
#[derive(Deserialize)]
struct RatingRecord {
    #[serde(rename = "userId")]
    user: i64,
    #[serde(rename = "movieId")]
    item: i64,
    rating: f64,
}

/// Reads all ratings from any CSV source, in file order.
pub fn ratings_from_csv<R: Read>(reader: &mut csv::Reader<R>) -> Result<Vec<Rating>> {
    let mut ratings = Vec::new();

    for record in reader.deserialize() {
        let record: RatingRecord = record?;
        ratings.push(Rating::new(record.user, record.item, record.rating));
    }

    Ok(ratings)
}

pub fn read_ratings<P: AsRef<Path>>(path: P) -> Result<Vec<Rating>> {
    ratings_from_csv(&mut csv_reader(path)?)
}

/// Reads a movies file: `movieId,title,genres`.
pub fn read_movies<P: AsRef<Path>>(path: P) -> Result<Vec<Movie>> {
    let mut reader = csv_reader(path)?;
    let mut movies = Vec::new();

    for record in reader.deserialize() {
        movies.push(record?);
    }

    Ok(movies)
}

/// Reads a links file: `movieId,imdbId,tmdbId`, the external ids may be empty.
pub fn read_links<P: AsRef<Path>>(path: P) -> Result<Vec<Link>> {
    let mut reader = csv_reader(path)?;
    let mut links = Vec::new();

    for record in reader.deserialize() {
        links.push(record?);
    }

    Ok(links)
}

pub fn read_catalog<P: AsRef<Path>>(movies_path: P, links_path: Option<P>) -> Result<Catalog> {
    let movies = read_movies(movies_path)?;
    let links = match links_path {
        Some(path) => read_links(path)?,
        None => Vec::new(),
    };

    Ok(Catalog::new(movies, links))
}

/// Struct used for JSON serialization of a recommended item. Field names will be used in JSON.
#[derive(Serialize)]
struct Recommendation<'a> {
    movie_id: ItemId,
    title: Option<&'a str>,
    tmdb_id: Option<u64>,
}

/// Writes one JSON object per recommended item, resolving titles and external identifiers
/// through the catalog.
pub fn write_recommendations<W: Write>(
    out: &mut W,
    recommended: &[ItemId],
    catalog: &Catalog,
) -> Result<()> {

    for item in recommended {
        let recommendation = Recommendation {
            movie_id: *item,
            title: catalog.title_of(*item),
            tmdb_id: catalog.external_id(*item),
        };

        writeln!(out, "{}", serde_json::to_string(&recommendation)?)?;
    }

    Ok(())
}

/// Struct used for JSON serialization of the recommendations for a user in batch mode.
#[derive(Serialize)]
struct UserRecommendations<'a> {
    user_id: i64,
    recommended: &'a [ItemId],
}

pub fn write_user_recommendations<W: Write>(
    out: &mut W,
    recommendations: &[(i64, Vec<ItemId>)],
) -> Result<()> {

    for (user_id, recommended) in recommendations {
        let entry = UserRecommendations { user_id: *user_id, recommended };
        writeln!(out, "{}", serde_json::to_string(&entry)?)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {

    use std::io::Write;

    use tempfile::NamedTempFile;

    use crate::catalog::Catalog;
    use crate::error::RecoError;
    use crate::io;
    use crate::types::Rating;

    fn file_with(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn movielens_ratings() {
        let file = file_with("userId,movieId,rating,timestamp\n\
            1,1,4.0,964982703\n\
            1,3,4.0,964981247\n\
            2,318,3.5,1445714835\n");

        let ratings = io::read_ratings(file.path()).unwrap();

        assert_eq!(ratings, vec![
            Rating::new(1, 1, 4.0),
            Rating::new(1, 3, 4.0),
            Rating::new(2, 318, 3.5),
        ]);
    }

    #[test]
    fn malformed_ratings() {
        let file = file_with("userId,movieId,rating,timestamp\n1,1,great,964982703\n");

        match io::read_ratings(file.path()) {
            Err(RecoError::Csv(_)) => {},
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn catalog_with_links() {
        let movies = file_with("movieId,title,genres\n\
            1,Toy Story (1995),Adventure|Animation|Children|Comedy|Fantasy\n\
            2,\"American President, The (1995)\",Comedy|Drama|Romance\n");
        let links = file_with("movieId,imdbId,tmdbId\n1,0114709,862\n2,0112346,\n");

        let catalog = io::read_catalog(movies.path(), Some(links.path())).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.item_for_title("American President, The (1995)"), Some(2));
        assert_eq!(catalog.external_id(1), Some(862));
        assert_eq!(catalog.external_id(2), None);
    }

    #[test]
    fn json_lines() {
        let catalog = Catalog::new(
            vec![crate::catalog::Movie {
                item: 1,
                title: "Toy Story (1995)".to_string(),
                genres: String::new(),
            }],
            vec![crate::catalog::Link { item: 1, imdb_id: None, tmdb_id: Some(862) }],
        );

        let mut out: Vec<u8> = Vec::new();
        io::write_recommendations(&mut out, &[1, 7], &catalog).unwrap();

        let lines: Vec<serde_json::Value> = String::from_utf8(out).unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["movie_id"], 1);
        assert_eq!(lines[0]["title"], "Toy Story (1995)");
        assert_eq!(lines[0]["tmdb_id"], 862);
        assert!(lines[1]["title"].is_null());

        let mut out: Vec<u8> = Vec::new();
        io::write_user_recommendations(&mut out, &[(3, vec![10, 20])]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{\"user_id\":3,\"recommended\":[10,20]}\n");
    }
}
