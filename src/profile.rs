use fnv::FnvHashSet;
use tracing::debug;

use crate::catalog::Catalog;
use crate::error::Result;
use crate::model::Model;
use crate::recommend::{self, RecommendOptions};
use crate::similarity::Metric;
use crate::types::{ItemId, Rating, UserId, GHOST_USER, MAX_RATING};

/// A synthetic user standing in for an anonymous session. Every selected title gets the same
/// rating from this user. The ratings only live in the copy returned by `inject` and are
/// never written back to the base ratings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticProfile {
    pub user: UserId,
    pub rating: f64,
}

impl Default for SyntheticProfile {
    fn default() -> Self {
        SyntheticProfile { user: GHOST_USER, rating: MAX_RATING }
    }
}

impl SyntheticProfile {

    /// The default profile, moved to the first free id below `GHOST_USER` if a real user of
    /// the base ratings already has that id.
    pub fn avoiding(base_ratings: &[Rating]) -> Self {
        let users: FnvHashSet<UserId> = base_ratings.iter().map(|rating| rating.user).collect();
        let mut profile = SyntheticProfile::default();

        if users.contains(&profile.user) {
            profile.user = (UserId::min_value()..GHOST_USER).rev()
                .find(|user| !users.contains(user))
                .unwrap_or(UserId::min_value());
            debug!("User {} exists, the synthetic profile uses id {}", GHOST_USER, profile.user);
        }

        profile
    }

    /// Items for the selected titles, in selection order. Titles are matched exactly, titles
    /// unknown to the catalog are skipped and repeated titles count once.
    pub fn resolve(&self, selected_titles: &[String], catalog: &Catalog) -> Vec<ItemId> {
        let mut seen = FnvHashSet::default();
        let mut items = Vec::with_capacity(selected_titles.len());

        for title in selected_titles {
            if !seen.insert(title.as_str()) {
                continue;
            }
            match catalog.item_for_title(title) {
                Some(item) => items.push(item),
                None => debug!("Dropping title '{}' which is not in the catalog", title),
            }
        }

        items
    }

    /// The base ratings followed by one rating of this profile's user per resolved title.
    pub fn inject(
        &self,
        selected_titles: &[String],
        catalog: &Catalog,
        base_ratings: &[Rating],
    ) -> Vec<Rating> {

        let items = self.resolve(selected_titles, catalog);

        let mut augmented = Vec::with_capacity(base_ratings.len() + items.len());
        augmented.extend_from_slice(base_ratings);
        augmented.extend(items.into_iter().map(|item| Rating::new(self.user, item, self.rating)));

        augmented
    }
}

/// Cold-start recommendations for a set of titles picked in an anonymous session: the titles
/// are folded into the ratings as a synthetic user, a model is fitted on the augmented ratings
/// and the synthetic user gets profile-mode recommendations. The synthetic user never shares
/// an id with a real user. Returns an empty list if none of the titles is in the catalog.
pub fn recommend_for_titles(
    base_ratings: &[Rating],
    catalog: &Catalog,
    selected_titles: &[String],
    metric: Metric,
    options: &RecommendOptions,
) -> Result<Vec<ItemId>> {

    let profile = SyntheticProfile::avoiding(base_ratings);
    let ratings = profile.inject(selected_titles, catalog, base_ratings);

    if ratings.len() == base_ratings.len() {
        return Ok(Vec::new());
    }

    let model = Model::fit(&ratings, metric);

    recommend::recommend_for_user(&model, &ratings, profile.user, options)
}
