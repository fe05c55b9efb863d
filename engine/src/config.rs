//! Startup configuration read from a line-oriented `key=value` file.

use std::fs;
use std::path::{Path, PathBuf};

use log::*;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config.ini";

/// Every key the file must define exactly once.
pub const REQUIRED_KEYS: [&str; 5] = ["rootDir", "title", "windowWidth", "windowHeight", "spirvPath"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not open config file at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config key `{0}` has an empty value")]
    EmptyValue(&'static str),

    #[error("config key `{key}` expects an unsigned integer, got `{value}`")]
    InvalidInteger { key: &'static str, value: String },

    #[error("config options not enough, missing: {}", .0.join(", "))]
    MissingKeys(Vec<&'static str>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub root_dir: String,
    pub title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub spirv_path: PathBuf,
    recognized: usize,
}

#[derive(Default)]
struct PartialConfig {
    root_dir: Option<String>,
    title: Option<String>,
    window_width: Option<u32>,
    window_height: Option<u32>,
    spirv_path: Option<String>,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Open {
            path: absolute(path),
            source,
        })?;
        info!("Found {} as config file", path.display());

        Config::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Config, ConfigError> {
        let mut partial = PartialConfig::default();

        for line in text.lines() {
            let line = line.trim_matches(is_blank);
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim_matches(is_blank);
            let value = value.trim_matches(is_blank);
            info!("- Read {} = {}", key, value);

            let replaced = match key {
                "rootDir" => partial
                    .root_dir
                    .replace(strip_trailing_slash(non_empty("rootDir", value)?))
                    .is_some(),
                "title" => partial
                    .title
                    .replace(non_empty("title", value)?.to_string())
                    .is_some(),
                "windowWidth" => partial
                    .window_width
                    .replace(unsigned("windowWidth", value)?)
                    .is_some(),
                "windowHeight" => partial
                    .window_height
                    .replace(unsigned("windowHeight", value)?)
                    .is_some(),
                "spirvPath" => partial
                    .spirv_path
                    .replace(strip_trailing_slash(non_empty("spirvPath", value)?))
                    .is_some(),
                _ => {
                    warn!("Unknown config key: {}", key);
                    continue;
                }
            };

            if replaced {
                warn!("Config key {} given more than once, keeping the last value", key);
            }
        }

        partial.finish()
    }

    /// Number of distinct recognized keys that populated this config.
    pub fn recognized_keys(&self) -> usize {
        self.recognized
    }
}

impl PartialConfig {
    fn finish(self) -> Result<Config, ConfigError> {
        let present = [
            self.root_dir.is_some(),
            self.title.is_some(),
            self.window_width.is_some(),
            self.window_height.is_some(),
            self.spirv_path.is_some(),
        ];
        let missing = REQUIRED_KEYS
            .iter()
            .zip(present)
            .filter(|(_, present)| !present)
            .map(|(key, _)| *key)
            .collect::<Vec<_>>();

        match self {
            PartialConfig {
                root_dir: Some(root_dir),
                title: Some(title),
                window_width: Some(window_width),
                window_height: Some(window_height),
                spirv_path: Some(spirv_path),
            } => Ok(Config {
                root_dir,
                title,
                window_width,
                window_height,
                spirv_path: PathBuf::from(spirv_path),
                recognized: present.len(),
            }),
            _ => Err(ConfigError::MissingKeys(missing)),
        }
    }
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn non_empty<'a>(key: &'static str, value: &'a str) -> Result<&'a str, ConfigError> {
    if value.is_empty() {
        Err(ConfigError::EmptyValue(key))
    } else {
        Ok(value)
    }
}

fn unsigned(key: &'static str, value: &str) -> Result<u32, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidInteger {
        key,
        value: value.to_string(),
    })
}

fn strip_trailing_slash(value: &str) -> String {
    match value.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => value.to_string(),
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMO: &str = "windowWidth=800\nwindowHeight=600\ntitle=Demo\nrootDir=.\nspirvPath=./shaders";

    #[test]
    fn parses_all_five_keys() {
        let config = Config::parse(DEMO).unwrap();

        assert_eq!(config.window_width, 800);
        assert_eq!(config.window_height, 600);
        assert_eq!(config.title, "Demo");
        assert_eq!(config.root_dir, ".");
        assert_eq!(config.spirv_path, PathBuf::from("./shaders"));
        assert_eq!(config.recognized_keys(), REQUIRED_KEYS.len());
    }

    #[test]
    fn strips_trailing_slash_from_paths() {
        let config = Config::parse(&DEMO.replace("./shaders", "./shaders/")).unwrap();
        assert_eq!(config.spirv_path, PathBuf::from("./shaders"));

        let config = Config::parse(&DEMO.replace("rootDir=.", "rootDir=/opt/app/")).unwrap();
        assert_eq!(config.root_dir, "/opt/app");
    }

    #[test]
    fn each_missing_key_is_an_error() {
        for key in REQUIRED_KEYS {
            let text = DEMO
                .lines()
                .filter(|line| !line.starts_with(key))
                .collect::<Vec<_>>()
                .join("\n");

            match Config::parse(&text) {
                Err(ConfigError::MissingKeys(missing)) => assert_eq!(missing, vec![key]),
                other => panic!("expected missing `{}`, got {:?}", key, other),
            }
        }
    }

    #[test]
    fn malformed_integer_is_an_error() {
        let text = DEMO.replace("windowWidth=800", "windowWidth=wide");
        assert!(matches!(
            Config::parse(&text),
            Err(ConfigError::InvalidInteger { key: "windowWidth", .. })
        ));

        let text = DEMO.replace("windowHeight=600", "windowHeight=-600");
        assert!(matches!(
            Config::parse(&text),
            Err(ConfigError::InvalidInteger { key: "windowHeight", .. })
        ));
    }

    #[test]
    fn unknown_keys_and_noise_are_ignored() {
        let text = format!("# demo\n\nvsync=on\nnot a pair\n{}\n", DEMO);
        let config = Config::parse(&text).unwrap();

        assert_eq!(config.recognized_keys(), 5);
        assert_eq!(config.title, "Demo");
    }

    #[test]
    fn trims_blanks_around_keys_and_values() {
        let text = DEMO.replace("title=Demo", " \ttitle =  Demo Window \t");
        let config = Config::parse(&text).unwrap();
        assert_eq!(config.title, "Demo Window");
    }

    #[test]
    fn empty_string_value_is_an_error() {
        let text = DEMO.replace("title=Demo", "title=");
        assert!(matches!(
            Config::parse(&text),
            Err(ConfigError::EmptyValue("title"))
        ));
    }

    #[test]
    fn repeated_key_keeps_last_value_without_counting_twice() {
        let text = format!("{}\ntitle=Again", DEMO);
        let config = Config::parse(&text).unwrap();

        assert_eq!(config.title, "Again");
        assert_eq!(config.recognized_keys(), 5);
    }
}
