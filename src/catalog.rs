use fnv::{FnvHashMap, FnvHashSet};

use crate::types::ItemId;

/// A movie as listed in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    #[serde(rename = "movieId")]
    pub item: ItemId,
    pub title: String,
    #[serde(default)]
    pub genres: String,
}

/// Crosswalk entry between a catalog item and the identifiers of external metadata providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(rename = "movieId")]
    pub item: ItemId,
    #[serde(rename = "imdbId", default)]
    pub imdb_id: Option<String>,
    #[serde(rename = "tmdbId", default)]
    pub tmdb_id: Option<u64>,
}

/// Title lookup in both directions plus the crosswalk to external metadata identifiers.
pub struct Catalog {
    titles: Vec<(ItemId, String)>,
    item_by_title: FnvHashMap<String, ItemId>,
    title_by_item: FnvHashMap<ItemId, String>,
    external_by_item: FnvHashMap<ItemId, u64>,
}

impl Catalog {

    /// If several movies share a title, the title resolves to the last one listed.
    pub fn new(movies: Vec<Movie>, links: Vec<Link>) -> Self {

        let mut titles = Vec::with_capacity(movies.len());

        let mut item_by_title: FnvHashMap<String, ItemId> =
            FnvHashMap::with_capacity_and_hasher(movies.len(), Default::default());
        let mut title_by_item: FnvHashMap<ItemId, String> =
            FnvHashMap::with_capacity_and_hasher(movies.len(), Default::default());

        for movie in movies.into_iter() {
            item_by_title.insert(movie.title.clone(), movie.item);
            title_by_item.insert(movie.item, movie.title.clone());
            titles.push((movie.item, movie.title));
        }

        let external_by_item: FnvHashMap<ItemId, u64> = links.into_iter()
            .filter_map(|link| link.tmdb_id.map(|tmdb_id| (link.item, tmdb_id)))
            .collect();

        Catalog { titles, item_by_title, title_by_item, external_by_item }
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn item_for_title(&self, title: &str) -> Option<ItemId> {
        self.item_by_title.get(title).cloned()
    }

    pub fn title_of(&self, item: ItemId) -> Option<&str> {
        self.title_by_item.get(&item).map(|title| title.as_str())
    }

    pub fn external_id(&self, item: ItemId) -> Option<u64> {
        self.external_by_item.get(&item).cloned()
    }

    /// Distinct titles in catalog order, e.g. to offer them in a picker.
    pub fn titles(&self) -> Vec<&str> {
        let mut seen = FnvHashSet::default();

        self.titles.iter()
            .map(|(_, title)| title.as_str())
            .filter(|title| seen.insert(*title))
            .collect()
    }

    /// External identifiers of the given items, following the catalog's order. Items without
    /// a crosswalk entry are skipped.
    pub fn external_ids(&self, items: &[ItemId]) -> Vec<u64> {
        let wanted: FnvHashSet<ItemId> = items.iter().cloned().collect();

        self.titles.iter()
            .filter(|(item, _)| wanted.contains(item))
            .filter_map(|(item, _)| self.external_id(*item))
            .collect()
    }
}
