use crate::lists::Site;
use crate::search;

/// The filtered, rendered view of one collection plus its selection
/// cursor. The cursor is ephemeral: it never outlives a rebuild and is
/// `None` (unset) exactly when the visible set is empty.
#[derive(Debug, Default)]
pub struct Selection {
    rows: Vec<Site>,
    cursor: Option<usize>,
}

impl Selection {
    /// Recompute the visible subset for a filter term and reset the
    /// cursor: first row when anything is visible, unset otherwise.
    pub fn rebuild(&mut self, items: &[Site], query: &str) {
        self.rows = match search::normalize_query(query) {
            None => items.to_vec(),
            Some(q) => items
                .iter()
                .filter(|site| search::matches(&site.name, &q))
                .cloned()
                .collect(),
        };
        self.cursor = if self.rows.is_empty() { None } else { Some(0) };
    }

    pub fn rows(&self) -> &[Site] {
        &self.rows
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn selected(&self) -> Option<&Site> {
        self.cursor.and_then(|i| self.rows.get(i))
    }

    /// Move the cursor circularly through the visible rows. No-op while
    /// the visible set is empty.
    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.rows.len();
        if len == 0 {
            return;
        }
        let current = self.cursor.unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(len as isize) as usize;
        self.cursor = Some(next);
    }

    pub fn advance(&mut self) {
        self.move_cursor(1);
    }

    pub fn retreat(&mut self) {
        self.move_cursor(-1);
    }

    /// Read-only transition: the url to open, if the cursor is set.
    pub fn activate(&self) -> Option<&str> {
        self.selected().map(|site| site.url.as_str())
    }

    /// Point the cursor at the first row matching the predicate, if any.
    /// Used to keep the cursor on an entry that was just moved.
    pub fn select_matching<F>(&mut self, pred: F)
    where
        F: Fn(&Site) -> bool,
    {
        if let Some(index) = self.rows.iter().position(|site| pred(site)) {
            self.cursor = Some(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(name: &str, url: &str) -> Site {
        Site {
            stack: "tech".to_string(),
            name: name.to_string(),
            url: url.to_string(),
        }
    }

    fn items() -> Vec<Site> {
        vec![
            site("GitHub", "u1"),
            site("GitLab", "u2"),
            site("MDN", "u3"),
        ]
    }

    #[test]
    fn matching_filter_selects_first_match() {
        let mut sel = Selection::default();
        sel.rebuild(&items(), "git");
        assert_eq!(sel.rows().len(), 2);
        assert_eq!(sel.cursor(), Some(0));
        assert_eq!(sel.activate(), Some("u1"));
    }

    #[test]
    fn non_matching_filter_unsets_cursor() {
        let mut sel = Selection::default();
        sel.rebuild(&items(), "zzz");
        assert!(sel.rows().is_empty());
        assert_eq!(sel.cursor(), None);
        assert_eq!(sel.activate(), None);
    }

    #[test]
    fn cursor_wraps_in_both_directions() {
        let mut sel = Selection::default();
        sel.rebuild(&items(), "");
        sel.retreat();
        assert_eq!(sel.cursor(), Some(2));
        sel.advance();
        assert_eq!(sel.cursor(), Some(0));
        sel.advance();
        sel.advance();
        sel.advance();
        assert_eq!(sel.cursor(), Some(0));
    }

    #[test]
    fn navigation_covers_only_visible_rows() {
        let mut sel = Selection::default();
        sel.rebuild(&items(), "git");
        sel.advance();
        assert_eq!(sel.activate(), Some("u2"));
        sel.advance();
        assert_eq!(sel.activate(), Some("u1"));
    }

    #[test]
    fn rebuild_resets_a_moved_cursor() {
        let mut sel = Selection::default();
        sel.rebuild(&items(), "");
        sel.advance();
        sel.advance();
        assert_eq!(sel.cursor(), Some(2));
        sel.rebuild(&items(), "");
        assert_eq!(sel.cursor(), Some(0));
    }

    #[test]
    fn empty_rebuild_unsets_cursor_and_freezes_navigation() {
        let mut sel = Selection::default();
        sel.rebuild(&items(), "");
        sel.rebuild(&[], "");
        assert_eq!(sel.cursor(), None);
        assert!(sel.activate().is_none());
        sel.advance();
        assert_eq!(sel.cursor(), None);
    }
}
