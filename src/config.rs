use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use serde::de::Deserializer;
use serde::Deserialize;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_NAME: &str = "sitedeck";

#[derive(Debug, Clone)]
pub struct Config {
    pub store_path: Option<PathBuf>,
    pub open: CommandExec,
    pub keys: Keys,
    pub ui: UiColors,
}

#[derive(Debug, Clone)]
pub struct CommandExec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandExec {
    fn from_def(def: CommandDef) -> Option<Self> {
        match def {
            CommandDef::Simple(cmd) => {
                let trimmed = cmd.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(Self {
                        program: trimmed.to_string(),
                        args: Vec::new(),
                    })
                }
            }
            CommandDef::List(mut parts) => {
                if parts.is_empty() {
                    return None;
                }
                let program = parts.remove(0);
                Some(Self {
                    program,
                    args: parts,
                })
            }
        }
    }
}

#[cfg(target_os = "macos")]
fn default_open_command() -> CommandExec {
    CommandExec {
        program: "open".to_string(),
        args: Vec::new(),
    }
}

#[cfg(not(target_os = "macos"))]
fn default_open_command() -> CommandExec {
    CommandExec {
        program: "xdg-open".to_string(),
        args: Vec::new(),
    }
}

// =============================================================================
// Key Bindings - Context-aware with multiple bindings per action
// =============================================================================

/// All key bindings organized by context
#[derive(Debug, Clone)]
pub struct Keys {
    /// Global keys (work outside the search input and modals)
    pub global: GlobalKeys,
    /// Keys for the search input
    pub search_input: SearchInputKeys,
    /// Keys for list navigation (sites and favorites panes)
    pub list: ListKeys,
    /// Keys for modal dialogs
    pub modal: ModalKeys,
}

#[derive(Debug, Clone)]
pub struct GlobalKeys {
    pub quit: Vec<String>,
    pub search: Vec<String>,
    pub help: Vec<String>,
}

impl Default for GlobalKeys {
    fn default() -> Self {
        Self {
            quit: vec!["q".into()],
            search: vec!["/".into()],
            help: vec!["F1".into(), "?".into()],
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchInputKeys {
    pub cancel: Vec<String>,
    pub confirm: Vec<String>,
    pub next: Vec<String>,
    pub prev: Vec<String>,
}

impl Default for SearchInputKeys {
    fn default() -> Self {
        Self {
            cancel: vec!["Esc".into()],
            confirm: vec!["Enter".into()],
            next: vec!["Down".into()],
            prev: vec!["Up".into()],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListKeys {
    pub next: Vec<String>,
    pub prev: Vec<String>,
    pub open: Vec<String>,
    pub favorite: Vec<String>,
    pub unfavorite: Vec<String>,
    pub move_up: Vec<String>,
    pub move_down: Vec<String>,
    pub switch_pane: Vec<String>,
    pub import: Vec<String>,
    pub delete: Vec<String>,
    pub delete_all: Vec<String>,
}

impl Default for ListKeys {
    fn default() -> Self {
        Self {
            next: vec!["j".into(), "Down".into()],
            prev: vec!["k".into(), "Up".into()],
            open: vec!["Enter".into()],
            favorite: vec!["f".into()],
            unfavorite: vec!["x".into()],
            move_up: vec!["K".into()],
            move_down: vec!["J".into()],
            switch_pane: vec!["Tab".into()],
            import: vec!["i".into()],
            delete: vec!["d".into()],
            delete_all: vec!["D".into()],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModalKeys {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

impl Default for ModalKeys {
    fn default() -> Self {
        Self {
            confirm: vec!["Enter".into(), "y".into()],
            cancel: vec!["Esc".into(), "n".into()],
        }
    }
}

// =============================================================================
// UI colors
// =============================================================================

#[derive(Debug, Clone)]
pub struct UiColors {
    pub border: RgbColor,
    pub selection_bg: RgbColor,
    pub selection_fg: RgbColor,
    pub separator: RgbColor,
    pub status_fg: RgbColor,
    pub status_bg: RgbColor,
}

#[derive(Debug, Clone, Copy)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl<'de> serde::Deserialize<'de> for RgbColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Array([u8; 3]),
            Map { r: u8, g: u8, b: u8 },
        }

        let helper = Helper::deserialize(deserializer)?;
        let (r, g, b) = match helper {
            Helper::Array(values) => (values[0], values[1], values[2]),
            Helper::Map { r, g, b } => (r, g, b),
        };
        Ok(RgbColor { r, g, b })
    }
}

// =============================================================================
// Serde deserialization types (support both single string and array)
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum KeyBinding {
    Single(String),
    Multiple(Vec<String>),
}

impl KeyBinding {
    fn into_vec(self) -> Vec<String> {
        match self {
            KeyBinding::Single(s) => vec![s],
            KeyBinding::Multiple(v) => v,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum CommandDef {
    Simple(String),
    List(Vec<String>),
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    store_path: Option<PathBuf>,
    open: Option<CommandDef>,
    keys: KeysFile,
    ui: UiFile,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct KeysFile {
    global: GlobalKeysFile,
    search_input: SearchInputKeysFile,
    list: ListKeysFile,
    modal: ModalKeysFile,
}

impl From<KeysFile> for Keys {
    fn from(file: KeysFile) -> Self {
        Self {
            global: file.global.into(),
            search_input: file.search_input.into(),
            list: file.list.into(),
            modal: file.modal.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct GlobalKeysFile {
    quit: KeyBinding,
    search: KeyBinding,
    help: KeyBinding,
}

impl Default for GlobalKeysFile {
    fn default() -> Self {
        let defaults = GlobalKeys::default();
        Self {
            quit: KeyBinding::Multiple(defaults.quit),
            search: KeyBinding::Multiple(defaults.search),
            help: KeyBinding::Multiple(defaults.help),
        }
    }
}

impl From<GlobalKeysFile> for GlobalKeys {
    fn from(file: GlobalKeysFile) -> Self {
        Self {
            quit: file.quit.into_vec(),
            search: file.search.into_vec(),
            help: file.help.into_vec(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SearchInputKeysFile {
    cancel: KeyBinding,
    confirm: KeyBinding,
    next: KeyBinding,
    prev: KeyBinding,
}

impl Default for SearchInputKeysFile {
    fn default() -> Self {
        let defaults = SearchInputKeys::default();
        Self {
            cancel: KeyBinding::Multiple(defaults.cancel),
            confirm: KeyBinding::Multiple(defaults.confirm),
            next: KeyBinding::Multiple(defaults.next),
            prev: KeyBinding::Multiple(defaults.prev),
        }
    }
}

impl From<SearchInputKeysFile> for SearchInputKeys {
    fn from(file: SearchInputKeysFile) -> Self {
        Self {
            cancel: file.cancel.into_vec(),
            confirm: file.confirm.into_vec(),
            next: file.next.into_vec(),
            prev: file.prev.into_vec(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ListKeysFile {
    next: KeyBinding,
    prev: KeyBinding,
    open: KeyBinding,
    favorite: KeyBinding,
    unfavorite: KeyBinding,
    move_up: KeyBinding,
    move_down: KeyBinding,
    switch_pane: KeyBinding,
    import: KeyBinding,
    delete: KeyBinding,
    delete_all: KeyBinding,
}

impl Default for ListKeysFile {
    fn default() -> Self {
        let defaults = ListKeys::default();
        Self {
            next: KeyBinding::Multiple(defaults.next),
            prev: KeyBinding::Multiple(defaults.prev),
            open: KeyBinding::Multiple(defaults.open),
            favorite: KeyBinding::Multiple(defaults.favorite),
            unfavorite: KeyBinding::Multiple(defaults.unfavorite),
            move_up: KeyBinding::Multiple(defaults.move_up),
            move_down: KeyBinding::Multiple(defaults.move_down),
            switch_pane: KeyBinding::Multiple(defaults.switch_pane),
            import: KeyBinding::Multiple(defaults.import),
            delete: KeyBinding::Multiple(defaults.delete),
            delete_all: KeyBinding::Multiple(defaults.delete_all),
        }
    }
}

impl From<ListKeysFile> for ListKeys {
    fn from(file: ListKeysFile) -> Self {
        Self {
            next: file.next.into_vec(),
            prev: file.prev.into_vec(),
            open: file.open.into_vec(),
            favorite: file.favorite.into_vec(),
            unfavorite: file.unfavorite.into_vec(),
            move_up: file.move_up.into_vec(),
            move_down: file.move_down.into_vec(),
            switch_pane: file.switch_pane.into_vec(),
            import: file.import.into_vec(),
            delete: file.delete.into_vec(),
            delete_all: file.delete_all.into_vec(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ModalKeysFile {
    confirm: KeyBinding,
    cancel: KeyBinding,
}

impl Default for ModalKeysFile {
    fn default() -> Self {
        let defaults = ModalKeys::default();
        Self {
            confirm: KeyBinding::Multiple(defaults.confirm),
            cancel: KeyBinding::Multiple(defaults.cancel),
        }
    }
}

impl From<ModalKeysFile> for ModalKeys {
    fn from(file: ModalKeysFile) -> Self {
        Self {
            confirm: file.confirm.into_vec(),
            cancel: file.cancel.into_vec(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct UiFile {
    colors: UiColorsFile,
}

impl Default for UiFile {
    fn default() -> Self {
        Self {
            colors: UiColorsFile::default(),
        }
    }
}

impl From<UiFile> for UiColors {
    fn from(file: UiFile) -> Self {
        Self {
            border: file.colors.border,
            selection_bg: file.colors.selection_bg,
            selection_fg: file.colors.selection_fg,
            separator: file.colors.separator,
            status_fg: file.colors.status_fg,
            status_bg: file.colors.status_bg,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct UiColorsFile {
    border: RgbColor,
    selection_bg: RgbColor,
    selection_fg: RgbColor,
    separator: RgbColor,
    status_fg: RgbColor,
    status_bg: RgbColor,
}

impl Default for UiColorsFile {
    fn default() -> Self {
        Self {
            border: RgbColor::new(95, 175, 255),
            selection_bg: RgbColor::new(95, 175, 255),
            selection_fg: RgbColor::new(0, 0, 0),
            separator: RgbColor::new(95, 175, 255),
            status_fg: RgbColor::new(95, 175, 255),
            status_bg: RgbColor::new(0, 0, 0),
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Expand ~ to home directory in paths
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = home::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

fn default_config_path() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine config directories")?;
    Ok(base.config_dir().join(APP_NAME).join(CONFIG_FILE_NAME))
}

/// Load configuration. An explicitly given path must exist; a missing
/// file at the default path yields the built-in defaults.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => {
            let expanded = expand_tilde(path);
            if !expanded.exists() {
                bail!("configuration file not found at {}", expanded.display());
            }
            expanded
        }
        None => {
            let path = default_config_path()?;
            if !path.exists() {
                return Ok(default_config());
            }
            path
        }
    };

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration file at {}", path.display()))?;

    let value: toml::Value = toml::from_str(&raw)
        .with_context(|| format!("failed to parse {} as TOML", path.display()))?;

    warn_unknown_keys(&value);

    let cfg_file: ConfigFile = value
        .try_into()
        .with_context(|| format!("failed to deserialize config from {}", path.display()))?;

    Ok(Config {
        store_path: cfg_file.store_path.map(|p| expand_tilde(&p)),
        open: cfg_file
            .open
            .and_then(CommandExec::from_def)
            .unwrap_or_else(default_open_command),
        keys: cfg_file.keys.into(),
        ui: cfg_file.ui.into(),
    })
}

pub(crate) fn default_config() -> Config {
    Config {
        store_path: None,
        open: default_open_command(),
        keys: KeysFile::default().into(),
        ui: UiFile::default().into(),
    }
}

fn warn_unknown_keys(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };

    let known = HashSet::from(["store_path", "open", "keys", "ui"]);
    for key in table.keys() {
        if !known.contains(key.as_str()) {
            eprintln!("warning: unknown configuration key `{}`", key);
        }
    }

    if let Some(keys_val) = table.get("keys") {
        warn_unknown_keys_section(keys_val);
    }
}

fn warn_unknown_keys_section(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };

    let known_contexts = HashSet::from(["global", "search_input", "list", "modal"]);
    for key in table.keys() {
        if !known_contexts.contains(key.as_str()) {
            eprintln!("warning: unknown keys.* context `{}`", key);
        }
    }
}
