//! User configuration — backend settings, keybindings and persistence.
//!
//! Settings are stored as a simple key-value text file at
//! `$XDG_CONFIG_HOME/ref-tree/config.toml` (default `~/.config/ref-tree/config.toml`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::api::client::DEFAULT_TIMEOUT_SECS;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_TOAST_SECS: u64 = 4;

// ───────────────────────────────────────── actions ───────────

/// All configurable user actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ZoomIn,
    ZoomOut,
    ResetView,
    PanLeft,
    PanRight,
    PanUp,
    PanDown,
    SelectNext,
    SelectPrev,
    ToggleExpand,
    CycleViewMode,
    Search,
    CycleLevelFilter,
    Refresh,
    Export,
    Quit,
}

impl Action {
    /// Ordered list of all actions (config file order).
    pub const ALL: &[Action] = &[
        Action::ZoomIn,
        Action::ZoomOut,
        Action::ResetView,
        Action::PanLeft,
        Action::PanRight,
        Action::PanUp,
        Action::PanDown,
        Action::SelectNext,
        Action::SelectPrev,
        Action::ToggleExpand,
        Action::CycleViewMode,
        Action::Search,
        Action::CycleLevelFilter,
        Action::Refresh,
        Action::Export,
        Action::Quit,
    ];

    /// Key used in the config file.
    fn config_key(self) -> &'static str {
        match self {
            Action::ZoomIn => "zoom_in",
            Action::ZoomOut => "zoom_out",
            Action::ResetView => "reset_view",
            Action::PanLeft => "pan_left",
            Action::PanRight => "pan_right",
            Action::PanUp => "pan_up",
            Action::PanDown => "pan_down",
            Action::SelectNext => "select_next",
            Action::SelectPrev => "select_prev",
            Action::ToggleExpand => "toggle_expand",
            Action::CycleViewMode => "cycle_view_mode",
            Action::Search => "search",
            Action::CycleLevelFilter => "cycle_level_filter",
            Action::Refresh => "refresh",
            Action::Export => "export",
            Action::Quit => "quit",
        }
    }

    fn from_config_key(s: &str) -> Option<Self> {
        Action::ALL.iter().copied().find(|a| a.config_key() == s)
    }
}

// ───────────────────────────────────────── key bind ──────────

/// A single key binding — key code + modifier combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyBind {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBind {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Does this binding match a key event?  Only CTRL/ALT/SHIFT modifiers
    /// are compared, and SHIFT is ignored for printable characters since the
    /// character itself already carries it (`+` arrives as Shift+`+`).
    pub fn matches(&self, event: KeyEvent) -> bool {
        let mask = match self.code {
            KeyCode::Char(_) => KeyModifiers::CONTROL | KeyModifiers::ALT,
            _ => KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SHIFT,
        };
        self.code == event.code && (self.modifiers & mask) == (event.modifiers & mask)
    }

    /// User-friendly display string (e.g. `"←"`, `"Ctrl+r"`, `"q"`).
    pub fn display(&self) -> String {
        self.render(true)
    }

    /// Serialise to config-file format (e.g. `"Left"`, `"Ctrl+r"`, `"Plus"`).
    fn to_config_string(&self) -> String {
        self.render(false)
    }

    fn render(&self, pretty: bool) -> String {
        let mut s = String::new();
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            s.push_str("Ctrl+");
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            s.push_str("Alt+");
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            s.push_str("Shift+");
        }
        s.push_str(&match (self.code, pretty) {
            (KeyCode::Char(' '), _) => "Space".into(),
            (KeyCode::Char('+'), false) => "Plus".into(),
            (KeyCode::Char(c), _) => c.to_string(),
            (KeyCode::Up, true) => "↑".into(),
            (KeyCode::Down, true) => "↓".into(),
            (KeyCode::Left, true) => "←".into(),
            (KeyCode::Right, true) => "→".into(),
            (KeyCode::Up, false) => "Up".into(),
            (KeyCode::Down, false) => "Down".into(),
            (KeyCode::Left, false) => "Left".into(),
            (KeyCode::Right, false) => "Right".into(),
            (KeyCode::Enter, _) => "Enter".into(),
            (KeyCode::Esc, _) => "Esc".into(),
            (KeyCode::Tab, _) => "Tab".into(),
            (KeyCode::Backspace, _) => "Backspace".into(),
            (KeyCode::Delete, _) => "Delete".into(),
            (KeyCode::Home, _) => "Home".into(),
            (KeyCode::End, _) => "End".into(),
            (KeyCode::PageUp, _) => "PageUp".into(),
            (KeyCode::PageDown, _) => "PageDown".into(),
            (KeyCode::F(n), _) => format!("F{n}"),
            (other, _) => format!("{other:?}"),
        });
        s
    }

    /// Parse a key string like `"Ctrl+r"`, `"Left"`, `"q"`, `"Plus"`.
    fn parse(s: &str) -> Option<Self> {
        let mut modifiers = KeyModifiers::NONE;
        let parts: Vec<&str> = s.split('+').collect();
        let key_part = parts.last()?;

        for &part in &parts[..parts.len() - 1] {
            match part.to_lowercase().as_str() {
                "ctrl" => modifiers |= KeyModifiers::CONTROL,
                "alt" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                _ => return None,
            }
        }

        let code = match key_part.to_lowercase().as_str() {
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "enter" | "return" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "tab" => KeyCode::Tab,
            "backspace" | "bksp" => KeyCode::Backspace,
            "delete" | "del" => KeyCode::Delete,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" | "pgup" => KeyCode::PageUp,
            "pagedown" | "pgdn" => KeyCode::PageDown,
            "space" => KeyCode::Char(' '),
            "plus" => KeyCode::Char('+'),
            s if s.starts_with('f') && s.len() > 1 => {
                let n: u8 = s[1..].parse().ok()?;
                KeyCode::F(n)
            }
            _ if key_part.chars().count() == 1 => KeyCode::Char(key_part.chars().next()?),
            _ => return None,
        };

        Some(KeyBind { code, modifiers })
    }
}

// ───────────────────────────────────────── config ────────────

/// Application configuration — backend settings and keybindings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bindings: HashMap<Action, Vec<KeyBind>>,
    /// Base URL of the referral REST API (no trailing slash needed).
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    /// Directory PNG exports are written to.
    pub export_dir: PathBuf,
    /// How long a toast stays in the status bar.
    pub toast_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bindings: Self::default_bindings(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            export_dir: PathBuf::from("."),
            toast_secs: DEFAULT_TOAST_SECS,
        }
    }
}

impl AppConfig {
    pub fn default_bindings() -> HashMap<Action, Vec<KeyBind>> {
        use Action::*;
        use KeyCode::*;
        let n = KeyModifiers::NONE;
        let mut m = HashMap::new();

        m.insert(ZoomIn, vec![KeyBind::new(Char('+'), n), KeyBind::new(Char('='), n)]);
        m.insert(ZoomOut, vec![KeyBind::new(Char('-'), n)]);
        m.insert(ResetView, vec![KeyBind::new(Char('0'), n)]);
        m.insert(PanLeft, vec![KeyBind::new(Left, n)]);
        m.insert(PanRight, vec![KeyBind::new(Right, n)]);
        m.insert(PanUp, vec![KeyBind::new(Up, n)]);
        m.insert(PanDown, vec![KeyBind::new(Down, n)]);
        m.insert(SelectNext, vec![KeyBind::new(Char('j'), n), KeyBind::new(Tab, n)]);
        m.insert(SelectPrev, vec![KeyBind::new(Char('k'), n)]);
        m.insert(ToggleExpand, vec![KeyBind::new(Enter, n), KeyBind::new(Char(' '), n)]);
        m.insert(CycleViewMode, vec![KeyBind::new(Char('v'), n)]);
        m.insert(Search, vec![KeyBind::new(Char('/'), n)]);
        m.insert(CycleLevelFilter, vec![KeyBind::new(Char('f'), n)]);
        m.insert(Refresh, vec![KeyBind::new(Char('r'), n)]);
        m.insert(Export, vec![KeyBind::new(Char('e'), n)]);
        m.insert(Quit, vec![KeyBind::new(Char('q'), n)]);

        m
    }

    /// Find the action that matches a key event.  When multiple bindings
    /// match, the one with the most modifiers wins.
    pub fn match_key(&self, event: KeyEvent) -> Option<Action> {
        let mut best: Option<Action> = None;
        let mut best_mod_count = 0;

        for (&action, binds) in &self.bindings {
            for bind in binds {
                if bind.matches(event) {
                    let mc = bind.modifiers.bits().count_ones();
                    if best.is_none() || mc > best_mod_count {
                        best = Some(action);
                        best_mod_count = mc;
                    }
                }
            }
        }
        best
    }

    /// Add a binding for `action`, removing the key from any other action.
    pub fn add_binding(&mut self, action: Action, bind: KeyBind) {
        for binds in self.bindings.values_mut() {
            binds.retain(|b| b != &bind);
        }
        self.bindings.entry(action).or_default().push(bind);
    }

    fn short_binding(&self, action: Action) -> String {
        match self.bindings.get(&action) {
            Some(binds) if !binds.is_empty() => binds[0].display(),
            _ => "?".into(),
        }
    }

    /// Build the status-bar hint string from current bindings.
    pub fn status_bar_hint(&self) -> String {
        format!(
            "{}/{}: zoom | {}: reset | drag/arrows: pan | {}: expand | {}: view | {}: search | {}: level | {}: refresh | {}: export | {}: quit",
            self.short_binding(Action::ZoomIn),
            self.short_binding(Action::ZoomOut),
            self.short_binding(Action::ResetView),
            self.short_binding(Action::ToggleExpand),
            self.short_binding(Action::CycleViewMode),
            self.short_binding(Action::Search),
            self.short_binding(Action::CycleLevelFilter),
            self.short_binding(Action::Refresh),
            self.short_binding(Action::Export),
            self.short_binding(Action::Quit),
        )
    }

    // ── persistence ─────────────────────────────────────────────

    /// Load config from the default location.  On first run the defaults are
    /// written out so there is a file to edit.
    pub fn load_or_create() -> Self {
        let path = config_path();
        if path.exists() {
            return Self::load_from(&path);
        }
        let config = Self::default();
        if let Err(err) = config.save_to(&path) {
            tracing::warn!("could not write default config to {}: {err}", path.display());
        }
        config
    }

    /// Load config from `path`, falling back to defaults.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents),
            Err(_) => Self::default(),
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.serialise())?;
        Ok(())
    }

    fn parse(s: &str) -> Self {
        let mut config = Self::default();

        for line in s.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            match key {
                "api_base_url" => {
                    let url = value.trim_matches('"');
                    if !url.is_empty() {
                        config.api_base_url = url.to_string();
                    }
                    continue;
                }
                "request_timeout_secs" => {
                    if let Ok(v) = value.parse::<u64>() {
                        config.request_timeout_secs = v.clamp(1, 300);
                    }
                    continue;
                }
                "export_dir" => {
                    let dir = value.trim_matches('"');
                    if !dir.is_empty() {
                        config.export_dir = PathBuf::from(dir);
                    }
                    continue;
                }
                "toast_secs" => {
                    if let Ok(v) = value.parse::<u64>() {
                        config.toast_secs = v.clamp(1, 60);
                    }
                    continue;
                }
                _ => {}
            }

            let Some(action) = Action::from_config_key(key) else {
                continue;
            };

            let mut parsed = Vec::new();
            for part in value.split(',') {
                let part = part.trim().trim_matches('"');
                if let Some(bind) = KeyBind::parse(part) {
                    parsed.push(bind);
                }
            }
            if !parsed.is_empty() {
                config.bindings.insert(action, Vec::new());
                for bind in parsed {
                    config.add_binding(action, bind);
                }
            }
        }

        config
    }

    fn serialise(&self) -> String {
        let mut lines = vec![
            "# ref-tree configuration".to_string(),
            String::new(),
            "# Backend".to_string(),
            format!("api_base_url = \"{}\"", self.api_base_url),
            format!("request_timeout_secs = {}", self.request_timeout_secs),
            format!("export_dir = \"{}\"", self.export_dir.display()),
            format!("toast_secs = {}", self.toast_secs),
            String::new(),
            "# Key bindings".to_string(),
            "# Format: action = Key1, Key2, ...".to_string(),
            "# Modifiers: Ctrl+, Alt+, Shift+ (prefix)".to_string(),
            "# Special keys: Up, Down, Left, Right, Enter, Esc, Tab, Space, Plus,".to_string(),
            "#   Backspace, Delete, Home, End, PageUp, PageDown, F1-F12".to_string(),
            String::new(),
        ];

        for &action in Action::ALL {
            if let Some(binds) = self.bindings.get(&action) {
                let keys: Vec<String> = binds.iter().map(|b| b.to_config_string()).collect();
                lines.push(format!("{} = {}", action.config_key(), keys.join(", ")));
            }
        }
        lines.push(String::new());
        lines.join("\n")
    }
}

/// Return the config file path (`$XDG_CONFIG_HOME/ref-tree/config.toml`).
fn config_path() -> PathBuf {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
    config_dir.join("ref-tree").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn defaults_cover_every_action() {
        let config = AppConfig::default();
        for action in Action::ALL {
            assert!(config.bindings.get(action).is_some_and(|b| !b.is_empty()), "{action:?} unbound");
        }
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn shifted_symbols_still_match() {
        let config = AppConfig::default();
        assert_eq!(config.match_key(key(KeyCode::Char('+'), KeyModifiers::SHIFT)), Some(Action::ZoomIn));
        assert_eq!(config.match_key(key(KeyCode::Char('-'), KeyModifiers::NONE)), Some(Action::ZoomOut));
        assert_eq!(config.match_key(key(KeyCode::Left, KeyModifiers::SHIFT)), None);
        assert_eq!(config.match_key(key(KeyCode::Char('r'), KeyModifiers::CONTROL)), None);
    }

    #[test]
    fn parses_settings_and_bindings() {
        let config = AppConfig::parse(
            "# comment\n\
             api_base_url = \"https://aff.example.com/api/v2\"\n\
             request_timeout_secs = 9000\n\
             export_dir = \"/tmp/exports\"\n\
             toast_secs = 0\n\
             refresh = Ctrl+r, F5\n\
             zoom_in = Plus\n\
             bogus = x\n\
             quit = Hyper+q\n",
        );
        assert_eq!(config.api_base_url, "https://aff.example.com/api/v2");
        assert_eq!(config.request_timeout_secs, 300);
        assert_eq!(config.export_dir, PathBuf::from("/tmp/exports"));
        assert_eq!(config.toast_secs, 1);
        assert_eq!(
            config.bindings[&Action::Refresh],
            vec![
                KeyBind::new(KeyCode::Char('r'), KeyModifiers::CONTROL),
                KeyBind::new(KeyCode::F(5), KeyModifiers::NONE),
            ]
        );
        assert_eq!(config.bindings[&Action::ZoomIn], vec![KeyBind::new(KeyCode::Char('+'), KeyModifiers::NONE)]);
        // Unparseable binding keeps the default.
        assert_eq!(config.bindings[&Action::Quit], AppConfig::default_bindings()[&Action::Quit]);
    }

    #[test]
    fn saved_config_reloads() {
        let mut config = AppConfig::default();
        config.api_base_url = "http://10.0.0.5:9000".into();
        config.add_binding(Action::Export, KeyBind::new(KeyCode::Char('x'), KeyModifiers::ALT));

        let reloaded = AppConfig::parse(&config.serialise());
        assert_eq!(reloaded.api_base_url, "http://10.0.0.5:9000");
        assert_eq!(reloaded.bindings, config.bindings);
    }

    #[test]
    fn file_round_trip() {
        let dir = std::env::temp_dir().join(format!("ref-tree-config-{}", std::process::id()));
        let path = dir.join("config.toml");
        let mut config = AppConfig::default();
        config.toast_secs = 7;
        config.save_to(&path).unwrap();
        assert_eq!(AppConfig::load_from(&path).toast_secs, 7);
        let _ = std::fs::remove_dir_all(&dir);
        assert_eq!(AppConfig::load_from(&path).toast_secs, DEFAULT_TOAST_SECS);
    }

    #[test]
    fn rebinding_moves_key_between_actions() {
        let config = AppConfig::parse("refresh = q\n");
        assert!(config.bindings[&Action::Quit].is_empty());
        assert_eq!(config.match_key(key(KeyCode::Char('q'), KeyModifiers::NONE)), Some(Action::Refresh));
    }
}
