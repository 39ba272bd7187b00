use anyhow::Result;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Light/dark preference for the interactive UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

impl FromStr for Theme {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(()),
        }
    }
}

/// Resolve the startup theme: a saved preference wins, otherwise the
/// terminal's background hint decides, defaulting to dark.
pub fn init_theme() -> Theme {
    if let Some(saved) = read_saved_theme() {
        return saved;
    }

    std::env::var("COLORFGBG")
        .ok()
        .and_then(|v| theme_from_colorfgbg(&v))
        .unwrap_or(Theme::Dark)
}

/// Persist an explicit user choice.
pub fn set_theme(theme: Theme) -> Result<()> {
    let path = theme_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, theme.to_string())?;
    Ok(())
}

fn read_saved_theme() -> Option<Theme> {
    let path = theme_path().ok()?;
    let content = std::fs::read_to_string(path).ok()?;
    content.parse().ok()
}

fn theme_path() -> Result<PathBuf> {
    if let Ok(home) = std::env::var("TASKBUDDY_HOME") {
        return Ok(PathBuf::from(home).join(".taskbuddy").join("theme"));
    }

    Ok(directories::UserDirs::new()
        .ok_or_else(|| anyhow::anyhow!("Failed to get home directory"))?
        .home_dir()
        .join(".taskbuddy")
        .join("theme"))
}

/// `COLORFGBG` looks like `"15;0"` (foreground;background). Low background
/// color numbers mean a dark terminal.
fn theme_from_colorfgbg(value: &str) -> Option<Theme> {
    let bg: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
    if bg <= 6 || bg == 8 {
        Some(Theme::Dark)
    } else {
        Some(Theme::Light)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_round_trip_strings() {
        assert_eq!("light".parse::<Theme>().unwrap(), Theme::Light);
        assert_eq!("dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert_eq!(Theme::Light.to_string(), "light");
        assert!("solarized".parse::<Theme>().is_err());
    }

    #[test]
    fn test_colorfgbg_detection() {
        assert_eq!(theme_from_colorfgbg("15;0"), Some(Theme::Dark));
        assert_eq!(theme_from_colorfgbg("0;15"), Some(Theme::Light));
        assert_eq!(theme_from_colorfgbg("12;default;8"), Some(Theme::Dark));
        assert_eq!(theme_from_colorfgbg("garbage"), None);
    }
}
