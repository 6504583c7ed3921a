use std::io::stdout;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;
use tui_widgets::popup::PopupState;

use crate::config::Config;
use crate::csv_import;
use crate::lists::{Lists, MoveDirection};
use crate::select::Selection;
use crate::store::StoreError;

use super::draw;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFocus {
    Input,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Sites,
    Favorites,
}

#[derive(Debug, Clone)]
pub struct ConfirmModal {
    pub title: String,
    pub message: String,
    pub action: ConfirmAction,
}

/// Action to perform when the confirm modal is accepted
#[derive(Debug, Clone, Copy)]
pub enum ConfirmAction {
    /// Clear the imported site list, keeping favorites
    ClearSites,
    /// Clear both the site list and the favorites
    ClearAll,
}

/// CSV path input modal
#[derive(Debug, Clone)]
pub struct ImportModal {
    pub input: Input,
}

pub struct App<'a> {
    config: &'a Config,
    lists: Lists,
    pub search_input: Input,
    pub search_focus: SearchFocus,
    pub focused_pane: Pane,
    pub sites_view: Selection,
    pub favorites_view: Selection,
    pub status: Option<String>,
    pub confirm_modal: Option<ConfirmModal>,
    pub import_modal: Option<ImportModal>,
    pub help_modal: bool,
    // Popup state for modal dialogs (tui-widgets popup)
    pub modal_popup: PopupState,
}

impl<'a> App<'a> {
    pub fn new(config: &'a Config, lists: Lists) -> Self {
        let mut app = Self {
            config,
            lists,
            search_input: Input::default(),
            search_focus: SearchFocus::Input,
            focused_pane: Pane::Sites,
            sites_view: Selection::default(),
            favorites_view: Selection::default(),
            status: None,
            confirm_modal: None,
            import_modal: None,
            help_modal: false,
            modal_popup: PopupState::default(),
        };
        app.rebuild_views();
        app
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    pub fn lists(&self) -> &Lists {
        &self.lists
    }

    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop<B>(&mut self, terminal: &mut Terminal<B>) -> Result<()>
    where
        B: ratatui::backend::Backend,
    {
        loop {
            draw::render(terminal, self)?;

            if event::poll(Duration::from_millis(250))? {
                match event::read()? {
                    Event::Key(key) => {
                        if self.handle_key(key)? {
                            break;
                        }
                    }
                    Event::Resize(_, _) => {}
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Recompute both visible views from the collections and the current
    /// filter term. Resets the selection cursors.
    fn rebuild_views(&mut self) {
        let query = self.search_input.value().to_string();
        self.sites_view
            .rebuild(&self.lists.unfavorited_sites(), &query);
        self.favorites_view.rebuild(self.lists.favorites(), &query);
    }

    fn focused_view(&self) -> &Selection {
        match self.focused_pane {
            Pane::Sites => &self.sites_view,
            Pane::Favorites => &self.favorites_view,
        }
    }

    fn focused_view_mut(&mut self) -> &mut Selection {
        match self.focused_pane {
            Pane::Sites => &mut self.sites_view,
            Pane::Favorites => &mut self.favorites_view,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        // Ctrl+C always quits (hardcoded for safety)
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            return Ok(true);
        }

        // Status notices live until the next keypress.
        self.status = None;

        if self.help_modal {
            self.handle_help_modal_key(key);
            return Ok(false);
        }

        if self.confirm_modal.is_some() {
            self.handle_confirm_modal_key(key)?;
            return Ok(false);
        }

        if self.import_modal.is_some() {
            self.handle_import_modal_key(key)?;
            return Ok(false);
        }

        if self.search_focus == SearchFocus::Input && self.handle_search_key(key)? {
            return Ok(false);
        }

        self.handle_list_key(key)
    }

    fn handle_help_modal_key(&mut self, key: KeyEvent) {
        let modal_keys = &self.config.keys.modal;
        let global = &self.config.keys.global;
        if self.key_matches_any(&key, &modal_keys.cancel)
            || self.key_matches_any(&key, &global.help)
            || self.key_matches_any(&key, &global.quit)
        {
            self.help_modal = false;
            self.modal_popup = PopupState::default();
        }
    }

    fn handle_confirm_modal_key(&mut self, key: KeyEvent) -> Result<()> {
        let modal_keys = &self.config.keys.modal;

        if self.key_matches_any(&key, &modal_keys.cancel) {
            self.confirm_modal = None;
            self.modal_popup = PopupState::default();
            return Ok(());
        }

        if self.key_matches_any(&key, &modal_keys.confirm) {
            let action = self.confirm_modal.take().map(|m| m.action);
            self.modal_popup = PopupState::default();
            match action {
                Some(ConfirmAction::ClearSites) => {
                    let result = self.lists.clear_sites();
                    if self.report_store(result) {
                        self.set_status("Cleared imported site list");
                    }
                }
                Some(ConfirmAction::ClearAll) => {
                    let result = self.lists.clear_all();
                    if self.report_store(result) {
                        self.set_status("Cleared site list and favorites");
                    }
                }
                None => {}
            }
            self.rebuild_views();
        }

        Ok(())
    }

    fn handle_import_modal_key(&mut self, key: KeyEvent) -> Result<()> {
        // Only Esc cancels here. The configured cancel bindings may hold
        // character keys, which must reach the path input instead.
        if matches!(key.code, KeyCode::Esc) {
            self.import_modal = None;
            self.modal_popup = PopupState::default();
            return Ok(());
        }

        if matches!(key.code, KeyCode::Enter) {
            let value = self
                .import_modal
                .as_ref()
                .map(|m| m.input.value().trim().to_string())
                .unwrap_or_default();
            self.import_modal = None;
            self.modal_popup = PopupState::default();
            if value.is_empty() {
                return Ok(());
            }
            self.import_from(PathBuf::from(value));
            self.rebuild_views();
            return Ok(());
        }

        if let Some(modal) = self.import_modal.as_mut() {
            let _ = modal.input.handle_event(&Event::Key(key));
        }
        Ok(())
    }

    fn import_from(&mut self, path: PathBuf) {
        let report = match csv_import::read_csv_file(&path) {
            Ok(report) => report,
            Err(err) => {
                self.set_status(format!("Import failed: {err:#}"));
                return;
            }
        };

        let result = self.lists.import_merge(&report.sites);
        match result {
            Ok(outcome) => {
                let mut message = format!(
                    "Imported {} sites ({} new, {} duplicates)",
                    report.sites.len(),
                    outcome.added,
                    outcome.duplicates
                );
                if report.skipped > 0 {
                    message.push_str(&format!(", skipped {} malformed lines", report.skipped));
                }
                if outcome.dropped_favorites > 0 {
                    message.push_str(&format!(
                        ", dropped {} stale favorites",
                        outcome.dropped_favorites
                    ));
                }
                self.set_status(message);
            }
            Err(err) => self.set_status(format!("storage error: {err}")),
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> Result<bool> {
        let input_keys = &self.config.keys.search_input;

        // Cancel: move focus to the lists (do not clear the filter)
        if self.key_matches_any(&key, &input_keys.cancel) {
            self.search_focus = SearchFocus::List;
            return Ok(true);
        }

        // Confirm: open the selected entry
        if self.key_matches_any(&key, &input_keys.confirm) {
            self.open_selected();
            return Ok(true);
        }

        // Next/prev: navigate the focused pane while typing
        if self.key_matches_any(&key, &input_keys.next) {
            self.focused_view_mut().advance();
            return Ok(true);
        }
        if self.key_matches_any(&key, &input_keys.prev) {
            self.focused_view_mut().retreat();
            return Ok(true);
        }

        // Pass other keys to the input widget
        if let Some(change) = self.search_input.handle_event(&Event::Key(key)) {
            if change.value {
                self.rebuild_views();
            }
            return Ok(true);
        }
        Ok(false)
    }

    fn handle_list_key(&mut self, key: KeyEvent) -> Result<bool> {
        let global = &self.config.keys.global;
        let list = &self.config.keys.list;

        if self.key_matches_any(&key, &global.quit) {
            return Ok(true);
        }

        if self.key_matches_any(&key, &global.search) {
            self.search_focus = SearchFocus::Input;
            return Ok(false);
        }

        if self.key_matches_any(&key, &global.help) {
            self.help_modal = true;
            return Ok(false);
        }

        if self.key_matches_any(&key, &list.switch_pane) {
            self.focused_pane = match self.focused_pane {
                Pane::Sites => Pane::Favorites,
                Pane::Favorites => Pane::Sites,
            };
            return Ok(false);
        }

        if self.key_matches_any(&key, &list.next) {
            self.focused_view_mut().advance();
            return Ok(false);
        }
        if self.key_matches_any(&key, &list.prev) {
            self.focused_view_mut().retreat();
            return Ok(false);
        }

        if self.key_matches_any(&key, &list.open) {
            self.open_selected();
            return Ok(false);
        }

        if self.key_matches_any(&key, &list.favorite) {
            self.favorite_selected();
            return Ok(false);
        }

        if self.key_matches_any(&key, &list.unfavorite) {
            self.unfavorite_selected();
            return Ok(false);
        }

        if self.key_matches_any(&key, &list.move_up) {
            self.move_selected_favorite(MoveDirection::Up);
            return Ok(false);
        }
        if self.key_matches_any(&key, &list.move_down) {
            self.move_selected_favorite(MoveDirection::Down);
            return Ok(false);
        }

        if self.key_matches_any(&key, &list.import) {
            self.import_modal = Some(ImportModal {
                input: Input::default(),
            });
            return Ok(false);
        }

        if self.key_matches_any(&key, &list.delete) {
            self.confirm_modal = Some(ConfirmModal {
                title: "CLEAR SITE LIST".to_string(),
                message: "Delete the imported site list? Favorites are kept.".to_string(),
                action: ConfirmAction::ClearSites,
            });
            return Ok(false);
        }
        if self.key_matches_any(&key, &list.delete_all) {
            self.confirm_modal = Some(ConfirmModal {
                title: "CLEAR EVERYTHING".to_string(),
                message: "Delete the site list and all favorites?".to_string(),
                action: ConfirmAction::ClearAll,
            });
            return Ok(false);
        }

        Ok(false)
    }

    /// Open the url under the cursor of the focused pane. No-op when the
    /// cursor is unset; a spawn failure becomes a status notice.
    fn open_selected(&mut self) {
        let Some(url) = self.focused_view().activate().map(str::to_string) else {
            return;
        };
        match self.open_url(&url) {
            Ok(()) => self.set_status(format!("Opened {url}")),
            Err(err) => self.set_status(format!("open failed: {err:#}")),
        }
    }

    fn open_url(&self, url: &str) -> Result<()> {
        let command = &self.config.open;
        Command::new(&command.program)
            .args(&command.args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", command.program))?;
        Ok(())
    }

    fn favorite_selected(&mut self) {
        if self.focused_pane != Pane::Sites {
            return;
        }
        let Some(site) = self.sites_view.selected().cloned() else {
            return;
        };
        let result = self.lists.toggle_favorite(&site);
        match result {
            Ok(true) => {
                self.set_status(format!("Favorited {}", site.name));
                self.rebuild_views();
            }
            Ok(false) => {}
            Err(err) => self.set_status(format!("storage error: {err}")),
        }
    }

    fn unfavorite_selected(&mut self) {
        if self.focused_pane != Pane::Favorites {
            return;
        }
        let Some(site) = self.favorites_view.selected().cloned() else {
            return;
        };
        let result = self.lists.unfavorite(&site.url);
        match result {
            Ok(true) => {
                self.set_status(format!("Unfavorited {}", site.name));
                self.rebuild_views();
            }
            Ok(false) => {}
            Err(err) => self.set_status(format!("storage error: {err}")),
        }
    }

    fn move_selected_favorite(&mut self, direction: MoveDirection) {
        if self.focused_pane != Pane::Favorites {
            return;
        }
        let Some(url) = self.favorites_view.selected().map(|s| s.url.clone()) else {
            return;
        };
        let result = self.lists.reorder_favorite(&url, direction);
        match result {
            Ok(true) => {
                self.rebuild_views();
                // Keep the cursor on the entry that moved.
                self.favorites_view.select_matching(|s| s.url == url);
            }
            Ok(false) => {}
            Err(err) => self.set_status(format!("storage error: {err}")),
        }
    }

    /// Surface a storage failure as a status notice instead of tearing
    /// the TUI down; memory and disk may now disagree, but the session
    /// stays usable.
    fn report_store(&mut self, result: Result<(), StoreError>) -> bool {
        match result {
            Ok(()) => true,
            Err(err) => {
                self.set_status(format!("storage error: {err}"));
                false
            }
        }
    }

    fn set_status<S: Into<String>>(&mut self, message: S) {
        self.status = Some(message.into());
    }

    fn key_matches_any(&self, event: &KeyEvent, bindings: &[String]) -> bool {
        bindings.iter().any(|b| key_matches_single(event, b))
    }
}

fn key_matches_single(event: &KeyEvent, binding: &str) -> bool {
    let trimmed = binding.trim();
    if trimmed.is_empty() {
        return false;
    }

    // Disallow Ctrl/Alt/Super modifiers (we don't support them)
    let disallowed = KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER;
    if event.modifiers.intersects(disallowed) {
        return false;
    }

    match trimmed.to_ascii_lowercase().as_str() {
        // Special keys
        "enter" => matches!(event.code, KeyCode::Enter),
        "tab" => matches!(event.code, KeyCode::Tab),
        "backtab" | "shift+tab" => matches!(event.code, KeyCode::BackTab),
        "backspace" => matches!(event.code, KeyCode::Backspace),
        "esc" | "escape" => matches!(event.code, KeyCode::Esc),
        "space" => matches!(event.code, KeyCode::Char(' ')),
        // Arrow keys
        "up" => matches!(event.code, KeyCode::Up),
        "down" => matches!(event.code, KeyCode::Down),
        "left" => matches!(event.code, KeyCode::Left),
        "right" => matches!(event.code, KeyCode::Right),
        // Function keys
        "f1" => matches!(event.code, KeyCode::F(1)),
        "f2" => matches!(event.code, KeyCode::F(2)),
        "f3" => matches!(event.code, KeyCode::F(3)),
        "f4" => matches!(event.code, KeyCode::F(4)),
        "f5" => matches!(event.code, KeyCode::F(5)),
        // Single character - case-sensitive (j != J, since J requires Shift)
        _ => {
            let mut chars = trimmed.chars();
            if let (Some(first), None) = (chars.next(), chars.next()) {
                matches!(event.code, KeyCode::Char(c) if c == first)
            } else {
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{self, CommandExec};
    use crate::lists::Site;
    use crate::store::Store;
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn lists_with(dir: &TempDir, sites: &[Site]) -> Lists {
        let store = Store::open(dir.path().join("store.json")).unwrap();
        let mut lists = Lists::load(store).unwrap();
        if !sites.is_empty() {
            lists.import_replace(sites).unwrap();
        }
        lists
    }

    fn site(name: &str, url: &str) -> Site {
        Site {
            stack: "tech".to_string(),
            name: name.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn single_char_bindings_are_case_sensitive() {
        assert!(key_matches_single(&key(KeyCode::Char('j')), "j"));
        assert!(!key_matches_single(&key(KeyCode::Char('J')), "j"));
        assert!(key_matches_single(
            &KeyEvent::new(KeyCode::Char('J'), KeyModifiers::SHIFT),
            "J"
        ));
    }

    #[test]
    fn named_keys_match_case_insensitively() {
        assert!(key_matches_single(&key(KeyCode::Enter), "Enter"));
        assert!(key_matches_single(&key(KeyCode::Esc), "escape"));
        assert!(key_matches_single(&key(KeyCode::Tab), "tab"));
        assert!(key_matches_single(&key(KeyCode::F(1)), "F1"));
    }

    #[test]
    fn control_modified_keys_never_match() {
        let event = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(!key_matches_single(&event, "q"));
    }

    #[test]
    fn cancel_letters_reach_the_import_path_input() {
        let dir = TempDir::new().unwrap();
        let config = config::default_config();
        let mut app = App::new(&config, lists_with(&dir, &[]));
        app.import_modal = Some(ImportModal {
            input: Input::default(),
        });

        // 'n' is a default modal cancel binding, but here it is a path
        // character and must be typed, not treated as cancel.
        app.handle_import_modal_key(key(KeyCode::Char('n'))).unwrap();
        let modal = app.import_modal.as_ref().unwrap();
        assert_eq!(modal.input.value(), "n");

        app.handle_import_modal_key(key(KeyCode::Esc)).unwrap();
        assert!(app.import_modal.is_none());
    }

    #[test]
    fn failed_open_command_becomes_a_status_notice() {
        let dir = TempDir::new().unwrap();
        let mut config = config::default_config();
        config.open = CommandExec {
            program: "/nonexistent/not-a-browser".to_string(),
            args: Vec::new(),
        };
        let mut app = App::new(&config, lists_with(&dir, &[site("GitHub", "u1")]));

        app.open_selected();
        let status = app.status.as_deref().unwrap();
        assert!(status.starts_with("open failed"), "status was {status:?}");
    }

    #[test]
    fn status_notice_clears_on_the_next_keypress() {
        let dir = TempDir::new().unwrap();
        let config = config::default_config();
        let mut app = App::new(&config, lists_with(&dir, &[site("GitHub", "u1")]));

        app.set_status("Opened u1");
        assert!(app.status.is_some());

        app.handle_key(key(KeyCode::Down)).unwrap();
        assert!(app.status.is_none());
    }
}
