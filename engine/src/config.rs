use serde::Deserialize;
use std::path::PathBuf;

// Default value function for serde (bool::default() is false, so only true needs a fn)
pub(crate) const fn default_true() -> bool {
    true
}

/// User configuration, read from `~/.pscode/config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct PsCodeConfig {
    pub editor: Option<EditorConfig>,
    pub host: Option<HostConfig>,
}

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

/// Editor widget settings.
///
/// ```toml
/// [editor]
/// show_line_numbers = true
/// welcome_text = "# scratch\n"
/// ```
#[derive(Debug, Deserialize)]
pub struct EditorConfig {
    #[serde(default = "default_true")]
    pub show_line_numbers: bool,
    /// Initial buffer contents. Defaults to the built-in welcome comment.
    pub welcome_text: Option<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            show_line_numbers: true,
            welcome_text: None,
        }
    }
}

/// PowerShell host settings, shared by the editor engine and the language
/// services bootstrap.
///
/// ```toml
/// [host]
/// pwsh = "/usr/local/bin/pwsh"
/// bundled_modules = "/opt/pses"
/// log_level = "Diagnostic"
/// startup_timeout_secs = 60
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct HostConfig {
    /// Override the `pwsh` executable; resolved via PATH when absent.
    pub pwsh: Option<String>,
    /// Root of the PowerShell Editor Services module bundle.
    pub bundled_modules: Option<String>,
    pub log_level: Option<String>,
    pub startup_timeout_secs: Option<u64>,
}

impl PsCodeConfig {
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let path = match config_path() {
            Some(path) => path,
            None => return Ok(None),
        };
        if !path.exists() {
            return Ok(None);
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read { path, source: err });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse { path, source: err })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".pscode").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_config() {
        let config: PsCodeConfig = toml::from_str("").unwrap();
        assert!(config.editor.is_none());
        assert!(config.host.is_none());
    }

    #[test]
    fn parse_editor_config() {
        let toml_str = r##"
[editor]
show_line_numbers = false
welcome_text = "# scratch\n"
"##;
        let config: PsCodeConfig = toml::from_str(toml_str).unwrap();
        let editor = config.editor.unwrap();
        assert!(!editor.show_line_numbers);
        assert_eq!(editor.welcome_text, Some("# scratch\n".to_string()));
    }

    #[test]
    fn editor_line_numbers_default_on() {
        let config: PsCodeConfig = toml::from_str("[editor]\n").unwrap();
        assert!(config.editor.unwrap().show_line_numbers);
    }

    #[test]
    fn parse_host_config() {
        let toml_str = r#"
[host]
pwsh = "/usr/local/bin/pwsh"
bundled_modules = "/opt/pses"
log_level = "Diagnostic"
startup_timeout_secs = 60
"#;
        let config: PsCodeConfig = toml::from_str(toml_str).unwrap();
        let host = config.host.unwrap();
        assert_eq!(host.pwsh, Some("/usr/local/bin/pwsh".to_string()));
        assert_eq!(host.bundled_modules, Some("/opt/pses".to_string()));
        assert_eq!(host.log_level, Some("Diagnostic".to_string()));
        assert_eq!(host.startup_timeout_secs, Some(60));
    }

    #[test]
    fn config_error_path_accessor() {
        let path = PathBuf::from("/test/path");
        let err = ConfigError::Read {
            path: path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.path(), &path);

        let parse_err = ConfigError::Parse {
            path: path.clone(),
            source: toml::from_str::<PsCodeConfig>("invalid toml [").unwrap_err(),
        };
        assert_eq!(parse_err.path(), &path);
    }
}
