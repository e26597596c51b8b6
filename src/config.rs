use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const MAX_DEPTH_VAR: &str = "BABOON_MAX_DEPTH";
pub const COLOR_VAR: &str = "BABOON_COLOR";
pub const HISTORY_VAR: &str = "BABOON_HISTORY";

pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            _ => Err(format!("expected auto, always or never, got {:?}", s)),
        }
    }
}

impl fmt::Display for ColorChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColorChoice::Auto => "auto",
            ColorChoice::Always => "always",
            ColorChoice::Never => "never",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub max_call_depth: usize,
    pub color: ColorChoice,
    pub history: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            color: ColorChoice::Auto,
            history: default_history_path(),
        }
    }
}

fn default_history_path() -> Option<PathBuf> {
    dirs::data_dir().map(|mut path| {
        path.push(".baboon_history");
        path
    })
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Builds a config from a variable lookup. Malformed values are logged and
    /// replaced by their defaults.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = lookup(MAX_DEPTH_VAR) {
            match raw.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => config.max_call_depth = depth,
                _ => log::warn!(
                    "ignoring {}={:?}: expected a positive integer",
                    MAX_DEPTH_VAR,
                    raw
                ),
            }
        }
        if let Some(raw) = lookup(COLOR_VAR) {
            match raw.trim().parse() {
                Ok(color) => config.color = color,
                Err(e) => log::warn!("ignoring {}: {}", COLOR_VAR, e),
            }
        }
        if let Some(raw) = lookup(HISTORY_VAR) {
            config.history = match raw.trim() {
                "" => None,
                path => Some(PathBuf::from(path)),
            };
        }
        log::debug!("{:?}", config);
        config
    }

    pub fn color_enabled(&self) -> bool {
        match self.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => atty::is(atty::Stream::Stdout) && atty::is(atty::Stream::Stderr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_without_variables() {
        let config = config_from(&[]);
        assert_eq!(config.max_call_depth, DEFAULT_MAX_CALL_DEPTH);
        assert_eq!(config.color, ColorChoice::Auto);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn variables_override_defaults() {
        let config = config_from(&[
            (MAX_DEPTH_VAR, "32"),
            (COLOR_VAR, "Never"),
            (HISTORY_VAR, "/tmp/history"),
        ]);
        assert_eq!(config.max_call_depth, 32);
        assert_eq!(config.color, ColorChoice::Never);
        assert_eq!(config.history, Some(PathBuf::from("/tmp/history")));
        assert!(!config.color_enabled());
    }

    #[test]
    fn malformed_values_fall_back() {
        let config = config_from(&[(MAX_DEPTH_VAR, "lots"), (COLOR_VAR, "sometimes")]);
        assert_eq!(config.max_call_depth, DEFAULT_MAX_CALL_DEPTH);
        assert_eq!(config.color, ColorChoice::Auto);
        assert_eq!(config_from(&[(MAX_DEPTH_VAR, "0")]).max_call_depth, DEFAULT_MAX_CALL_DEPTH);
    }

    #[test]
    fn empty_history_disables_it() {
        assert_eq!(config_from(&[(HISTORY_VAR, "")]).history, None);
    }
}
