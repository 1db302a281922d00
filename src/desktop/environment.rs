use std::fmt;

/// Desktop environments with a known way to set the wallpaper.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DesktopEnvironment {
    Gnome,
    Unity,
    Budgie,
    Pantheon,
    Cinnamon,
    Mate,
    Xfce,
    Kde,
    Lxde,
    Lxqt,
    Sway,
    I3,
    MacOs,
    Windows,
    Unknown(String),
}

impl DesktopEnvironment {
    /// Detects the environment of the current session.
    pub fn detect() -> Self {
        Self::detect_from(std::env::consts::OS, |name| std::env::var(name).ok())
    }

    /// Detection against an explicit OS name and variable lookup.
    pub fn detect_from(os: &str, var: impl Fn(&str) -> Option<String>) -> Self {
        match os {
            "macos" => return Self::MacOs,
            "windows" => return Self::Windows,
            _ => {}
        }
        if var("SWAYSOCK").is_some_and(|s| !s.is_empty()) {
            return Self::Sway;
        }

        let raw = var("XDG_CURRENT_DESKTOP")
            .filter(|s| !s.trim().is_empty())
            .or_else(|| var("DESKTOP_SESSION"))
            .unwrap_or_default();
        let lowered = raw.to_ascii_lowercase();

        lowered
            .split(':')
            .map(str::trim)
            .find_map(Self::from_session_name)
            .unwrap_or(Self::Unknown(raw))
    }

    fn from_session_name(name: &str) -> Option<Self> {
        let env = match name {
            n if n.starts_with("gnome") || n.starts_with("ubuntu") => Self::Gnome,
            "unity" => Self::Unity,
            "budgie" | "budgie-desktop" => Self::Budgie,
            "pantheon" => Self::Pantheon,
            "x-cinnamon" | "cinnamon" => Self::Cinnamon,
            "mate" => Self::Mate,
            n if n.starts_with("xfce") => Self::Xfce,
            "kde" | "plasma" | "plasmawayland" => Self::Kde,
            "lxqt" => Self::Lxqt,
            "lxde" | "lubuntu" => Self::Lxde,
            "sway" => Self::Sway,
            "i3" => Self::I3,
            _ => return None,
        };
        Some(env)
    }
}

impl fmt::Display for DesktopEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Gnome => "gnome",
            Self::Unity => "unity",
            Self::Budgie => "budgie",
            Self::Pantheon => "pantheon",
            Self::Cinnamon => "cinnamon",
            Self::Mate => "mate",
            Self::Xfce => "xfce4",
            Self::Kde => "kde",
            Self::Lxde => "lxde",
            Self::Lxqt => "lxqt",
            Self::Sway => "sway",
            Self::I3 => "i3",
            Self::MacOs => "mac",
            Self::Windows => "windows",
            Self::Unknown(raw) if raw.is_empty() => "unknown",
            Self::Unknown(raw) => raw,
        };
        f.write_str(name)
    }
}
