use serde::{Deserialize, Serialize};

use crate::store::{Store, StoreError};

/// One imported entry. `url` plus case-insensitive `name` form the
/// de-duplication key; favorites are addressed by exact `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub stack: String,
    pub name: String,
    pub url: String,
}

impl Site {
    fn same_entry(&self, other: &Site) -> bool {
        self.url == other.url && self.name.eq_ignore_ascii_case(&other.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// Counters reported after an import.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOutcome {
    /// Entries in the site list after the import.
    pub total: usize,
    /// Entries the import actually added.
    pub added: usize,
    /// Incoming entries dropped as duplicates of existing ones.
    pub duplicates: usize,
    /// Favorites dropped because their url left the site list.
    pub dropped_favorites: usize,
}

/// Deduplicated union: existing entries keep their relative order, new
/// entries are appended in incoming order. First occurrence wins.
pub fn merge_sites(existing: &[Site], incoming: &[Site]) -> Vec<Site> {
    let mut merged: Vec<Site> = Vec::with_capacity(existing.len() + incoming.len());
    for site in existing.iter().chain(incoming) {
        if !merged.iter().any(|kept| kept.same_entry(site)) {
            merged.push(site.clone());
        }
    }
    merged
}

/// The synchronizer owning both persisted collections. Every mutating
/// operation persists before returning and reports whether anything
/// changed, so the caller knows to rebuild its view.
pub struct Lists {
    store: Store,
    sites: Vec<Site>,
    favorites: Vec<Site>,
}

impl Lists {
    pub fn load(store: Store) -> Result<Self, StoreError> {
        let sites = store.site_list()?;
        let favorites = store.favorites()?;
        Ok(Self {
            store,
            sites,
            favorites,
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn favorites(&self) -> &[Site] {
        &self.favorites
    }

    pub fn is_favorite(&self, url: &str) -> bool {
        self.favorites.iter().any(|f| f.url == url)
    }

    /// The site list as rendered: entries already promoted to favorites
    /// are excluded. Computed, never stored.
    pub fn unfavorited_sites(&self) -> Vec<Site> {
        self.sites
            .iter()
            .filter(|site| !self.is_favorite(&site.url))
            .cloned()
            .collect()
    }

    /// Merge newly imported entries into the site list, then drop any
    /// favorite no longer backed by the merged list.
    pub fn import_merge(&mut self, incoming: &[Site]) -> Result<ImportOutcome, StoreError> {
        let merged = merge_sites(&self.sites, incoming);
        let kept = self.sites.len();
        self.apply_import(merged, incoming.len(), kept)
    }

    /// Replace the site list with the imported entries (deduplicated
    /// among themselves), then reconcile favorites against it.
    pub fn import_replace(&mut self, incoming: &[Site]) -> Result<ImportOutcome, StoreError> {
        let replaced = merge_sites(&[], incoming);
        self.apply_import(replaced, incoming.len(), 0)
    }

    fn apply_import(
        &mut self,
        merged: Vec<Site>,
        incoming_len: usize,
        kept: usize,
    ) -> Result<ImportOutcome, StoreError> {
        let total = merged.len();
        let added = total.saturating_sub(kept);
        self.sites = merged;
        self.store.set_site_list(&self.sites)?;

        let dropped_favorites = self.reconcile_favorites()?;

        Ok(ImportOutcome {
            total,
            added,
            duplicates: incoming_len.saturating_sub(added),
            dropped_favorites,
        })
    }

    /// Retain only favorites whose url still exists in the site list.
    /// Returns the number dropped.
    fn reconcile_favorites(&mut self) -> Result<usize, StoreError> {
        let before = self.favorites.len();
        let sites = std::mem::take(&mut self.sites);
        self.favorites.retain(|fav| sites.iter().any(|s| s.url == fav.url));
        self.sites = sites;
        let dropped = before - self.favorites.len();
        if dropped > 0 {
            self.store.set_favorites(&self.favorites)?;
        }
        Ok(dropped)
    }

    /// Append to favorites unless the url is already present. Idempotent.
    pub fn toggle_favorite(&mut self, site: &Site) -> Result<bool, StoreError> {
        if self.is_favorite(&site.url) {
            return Ok(false);
        }
        self.favorites.push(site.clone());
        self.store.set_favorites(&self.favorites)?;
        Ok(true)
    }

    /// Remove every favorite with this url. Silent no-op when absent.
    pub fn unfavorite(&mut self, url: &str) -> Result<bool, StoreError> {
        let before = self.favorites.len();
        self.favorites.retain(|f| f.url != url);
        if self.favorites.len() == before {
            return Ok(false);
        }
        self.store.set_favorites(&self.favorites)?;
        Ok(true)
    }

    /// Swap the favorite with its immediate neighbor. No-op at either
    /// boundary or when the url is not a favorite.
    pub fn reorder_favorite(
        &mut self,
        url: &str,
        direction: MoveDirection,
    ) -> Result<bool, StoreError> {
        let Some(index) = self.favorites.iter().position(|f| f.url == url) else {
            return Ok(false);
        };
        let target = match direction {
            MoveDirection::Up => {
                if index == 0 {
                    return Ok(false);
                }
                index - 1
            }
            MoveDirection::Down => {
                if index + 1 >= self.favorites.len() {
                    return Ok(false);
                }
                index + 1
            }
        };
        self.favorites.swap(index, target);
        self.store.set_favorites(&self.favorites)?;
        Ok(true)
    }

    /// Clear the site list only; favorites are preserved as-is.
    pub fn clear_sites(&mut self) -> Result<(), StoreError> {
        self.sites.clear();
        self.store.remove_site_list()
    }

    /// Clear both collections.
    pub fn clear_all(&mut self) -> Result<(), StoreError> {
        self.sites.clear();
        self.favorites.clear();
        self.store.remove_site_list()?;
        self.store.remove_favorites()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn site(stack: &str, name: &str, url: &str) -> Site {
        Site {
            stack: stack.to_string(),
            name: name.to_string(),
            url: url.to_string(),
        }
    }

    fn lists_in(dir: &TempDir) -> Lists {
        let store = Store::open(dir.path().join("store.json")).unwrap();
        Lists::load(store).unwrap()
    }

    #[test]
    fn merge_is_idempotent() {
        let sites = vec![
            site("tech", "GitHub", "https://github.com"),
            site("docs", "MDN", "https://developer.mozilla.org"),
        ];
        assert_eq!(merge_sites(&sites, &sites), sites);
    }

    #[test]
    fn merge_dedups_on_case_insensitive_name_and_exact_url() {
        let existing = vec![site("tech", "A", "u1")];
        let merged = merge_sites(&existing, &[site("tech", "a", "u1")]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].name, "A");

        // Same name at a different url is a distinct entry.
        let merged = merge_sites(&existing, &[site("tech", "A", "u2")]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn merge_keeps_existing_order_then_appends() {
        let existing = vec![site("t", "A", "u1"), site("t", "B", "u2")];
        let incoming = vec![site("t", "B", "u2"), site("t", "C", "u3")];
        let merged = merge_sites(&existing, &incoming);
        let names: Vec<&str> = merged.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C"]);
    }

    #[test]
    fn favorite_round_trip_restores_partition() {
        let dir = TempDir::new().unwrap();
        let mut lists = lists_in(&dir);
        lists
            .import_replace(&[site("t", "A", "u1"), site("t", "B", "u2")])
            .unwrap();

        let before_sites = lists.unfavorited_sites();
        let target = site("t", "A", "u1");

        assert!(lists.toggle_favorite(&target).unwrap());
        assert_eq!(lists.unfavorited_sites().len(), 1);
        assert_eq!(lists.favorites().len(), 1);

        // Toggling again is a no-op, not a duplicate.
        assert!(!lists.toggle_favorite(&target).unwrap());
        assert_eq!(lists.favorites().len(), 1);

        assert!(lists.unfavorite("u1").unwrap());
        assert_eq!(lists.unfavorited_sites(), before_sites);
        assert!(lists.favorites().is_empty());
    }

    #[test]
    fn unfavorite_missing_url_is_a_silent_noop() {
        let dir = TempDir::new().unwrap();
        let mut lists = lists_in(&dir);
        assert!(!lists.unfavorite("nope").unwrap());
    }

    #[test]
    fn reorder_boundaries_are_noops_and_middle_swaps() {
        let dir = TempDir::new().unwrap();
        let mut lists = lists_in(&dir);
        let sites = vec![site("t", "A", "u1"), site("t", "B", "u2"), site("t", "C", "u3")];
        lists.import_replace(&sites).unwrap();
        for s in &sites {
            lists.toggle_favorite(s).unwrap();
        }

        assert!(!lists.reorder_favorite("u1", MoveDirection::Up).unwrap());
        assert!(!lists.reorder_favorite("u3", MoveDirection::Down).unwrap());
        assert!(!lists.reorder_favorite("missing", MoveDirection::Up).unwrap());

        assert!(lists.reorder_favorite("u2", MoveDirection::Up).unwrap());
        let urls: Vec<&str> = lists.favorites().iter().map(|f| f.url.as_str()).collect();
        assert_eq!(urls, ["u2", "u1", "u3"]);
    }

    #[test]
    fn reconcile_drops_unbacked_favorites_in_order() {
        let dir = TempDir::new().unwrap();
        let mut lists = lists_in(&dir);
        lists
            .import_replace(&[site("t", "A", "u1"), site("t", "B", "u2"), site("t", "C", "u3")])
            .unwrap();
        lists.toggle_favorite(&site("t", "C", "u3")).unwrap();
        lists.toggle_favorite(&site("t", "A", "u1")).unwrap();

        // Reimport drops u3; the surviving favorite keeps its position.
        let outcome = lists
            .import_replace(&[site("t", "A", "u1"), site("t", "B", "u2")])
            .unwrap();
        assert_eq!(outcome.dropped_favorites, 1);
        let urls: Vec<&str> = lists.favorites().iter().map(|f| f.url.as_str()).collect();
        assert_eq!(urls, ["u1"]);
    }

    #[test]
    fn clear_sites_preserves_favorites_clear_all_does_not() {
        let dir = TempDir::new().unwrap();
        let mut lists = lists_in(&dir);
        lists.import_replace(&[site("t", "A", "u1")]).unwrap();
        lists.toggle_favorite(&site("t", "A", "u1")).unwrap();

        lists.clear_sites().unwrap();
        assert!(lists.sites().is_empty());
        assert_eq!(lists.favorites().len(), 1);

        lists.clear_all().unwrap();
        assert!(lists.sites().is_empty());
        assert!(lists.favorites().is_empty());
    }

    #[test]
    fn import_merge_reports_counts() {
        let dir = TempDir::new().unwrap();
        let mut lists = lists_in(&dir);
        lists
            .import_merge(&[site("t", "A", "u1"), site("t", "B", "u2")])
            .unwrap();

        let outcome = lists
            .import_merge(&[site("t", "B", "u2"), site("t", "C", "u3")])
            .unwrap();
        assert_eq!(outcome.total, 3);
        assert_eq!(outcome.added, 1);
        assert_eq!(outcome.duplicates, 1);
    }

    #[test]
    fn state_survives_reload() {
        let dir = TempDir::new().unwrap();
        {
            let mut lists = lists_in(&dir);
            lists
                .import_replace(&[site("t", "A", "u1"), site("t", "B", "u2")])
                .unwrap();
            lists.toggle_favorite(&site("t", "B", "u2")).unwrap();
        }

        let lists = lists_in(&dir);
        assert_eq!(lists.sites().len(), 2);
        assert_eq!(lists.favorites().len(), 1);
        assert_eq!(lists.favorites()[0].url, "u2");
    }
}
