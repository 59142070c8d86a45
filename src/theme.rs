pub const THEME_KEY: &str = "theme";
const LEGACY_DARK_MODE_KEY: &str = "darkMode";
const LEGACY_DARK_MODE_ENABLED: &str = "enabled";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn toggle_label(self) -> String {
        let next = self.toggled().as_str();
        format!("Switch to {next} theme")
    }

    pub fn pressed(self) -> bool {
        matches!(self, Self::Dark)
    }

    /// Glyph for the toggle's icon: the mode a click switches to.
    pub fn icon(self) -> &'static str {
        match self {
            Self::Light => "☾",
            Self::Dark => "☀",
        }
    }

    pub fn notice(self) -> &'static str {
        match self {
            Self::Light => "Light mode enabled",
            Self::Dark => "Dark mode enabled",
        }
    }
}

/// Browser-local key/value storage.
pub trait PreferenceStore {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&self, key: &str, value: &str) -> bool;
}

/// Stored preference, falling back to the legacy `darkMode` flag, then light.
pub fn resolve_theme(store: &impl PreferenceStore) -> Theme {
    if let Some(theme) = store
        .read(THEME_KEY)
        .and_then(|value| Theme::from_str(&value))
    {
        return theme;
    }

    match store.read(LEGACY_DARK_MODE_KEY).as_deref() {
        Some(LEGACY_DARK_MODE_ENABLED) => Theme::Dark,
        _ => Theme::Light,
    }
}

/// Flips `current` and persists the result. Returns the new theme and whether
/// it was stored.
pub fn toggle_theme(current: Theme, store: &impl PreferenceStore) -> (Theme, bool) {
    let next = current.toggled();
    let persisted = store.write(THEME_KEY, next.as_str());
    (next, persisted)
}
