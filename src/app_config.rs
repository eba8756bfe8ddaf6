//! Configuration file loading for CLI defaults.
//!
//! The file is a flat list of `key = value` lines (a TOML subset): strings
//! are double-quoted, integers are bare, `#` starts a comment outside quotes.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use fetchit_core::{FetchConfig, HttpTimeouts, UnknownPlatformPolicy};

const MAX_TIMEOUT_SECS: u64 = 3600;
const MAX_CHUNK_SIZE: u64 = 1024 * 1024;

/// Values read from the config file; `None` keeps the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    pub youtube_api_url: Option<String>,
    pub twitter_mirror_url: Option<String>,
    pub instagram_mirror_url: Option<String>,
    /// Connect timeout for every outbound call.
    pub connect_timeout_secs: Option<u64>,
    /// Total timeout for resolver requests.
    pub read_timeout_secs: Option<u64>,
    /// Idle-read timeout for media downloads; defaults to `read_timeout_secs`.
    pub download_read_timeout_secs: Option<u64>,
    pub chunk_size: Option<usize>,
    pub unknown_platform: Option<UnknownPlatformPolicy>,
    /// Directory for downloads when `-o`/`-d` are not given.
    pub output_dir: Option<PathBuf>,
}

impl FileConfig {
    /// Validates config values against runtime constraints.
    pub fn validate(&self) -> Result<()> {
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        validate_timeout_secs(
            "download_read_timeout_secs",
            self.download_read_timeout_secs,
        )?;

        if let Some(chunk_size) = self.chunk_size
            && (chunk_size == 0 || chunk_size as u64 > MAX_CHUNK_SIZE)
        {
            bail!(
                "Invalid config value for `chunk_size`: {chunk_size}. Expected range: 1..={MAX_CHUNK_SIZE}"
            );
        }

        for (field, value) in [
            ("youtube_api_url", &self.youtube_api_url),
            ("twitter_mirror_url", &self.twitter_mirror_url),
            ("instagram_mirror_url", &self.instagram_mirror_url),
        ] {
            if let Some(value) = value
                && !(value.starts_with("http://") || value.starts_with("https://"))
            {
                bail!("Invalid config value for `{field}`: '{value}'. Expected an http(s) URL");
            }
        }
        Ok(())
    }

    /// Overlays the file values onto library defaults.
    #[must_use]
    pub fn apply_to(&self, mut config: FetchConfig) -> FetchConfig {
        if let Some(url) = &self.youtube_api_url {
            config.endpoints.youtube_api_url.clone_from(url);
        }
        if let Some(url) = &self.twitter_mirror_url {
            config.endpoints.twitter_mirror_url.clone_from(url);
        }
        if let Some(url) = &self.instagram_mirror_url {
            config.endpoints.instagram_mirror_url.clone_from(url);
        }

        let connect = self
            .connect_timeout_secs
            .unwrap_or(config.resolver_timeouts.connect_secs);
        let read = self
            .read_timeout_secs
            .unwrap_or(config.resolver_timeouts.read_secs);
        let download_read = self.download_read_timeout_secs.unwrap_or(read);
        config.resolver_timeouts = HttpTimeouts::new(connect, read);
        config.download_timeouts = HttpTimeouts::new(connect, download_read);

        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
        if let Some(policy) = self.unknown_platform {
            config.unknown_platform = policy;
        }
        config
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=MAX_TIMEOUT_SECS).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..={MAX_TIMEOUT_SECS}");
    }
    Ok(())
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Path that was consulted, if any could be determined.
    pub path: Option<PathBuf>,
    /// Parsed values; default when no file was read.
    pub config: FileConfig,
    pub loaded_from_file: bool,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/fetchit/config.toml`
/// 2. `$HOME/.config/fetchit/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("fetchit")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("fetchit")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config named by `--config`, or the default file if present.
///
/// An explicit path must exist; a missing default file is not an error.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = load_file_config(path)?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config,
            loaded_from_file: true,
        });
    }

    let path = resolve_default_config_path();
    match path.as_deref() {
        Some(path_ref) if path_ref.exists() => {
            let config = load_file_config(path_ref)?;
            Ok(LoadedConfig {
                path,
                config,
                loaded_from_file: true,
            })
        }
        _ => Ok(LoadedConfig {
            path,
            config: FileConfig::default(),
            loaded_from_file: false,
        }),
    }
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let line_no = line_index + 1;
        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let context = || format!("Invalid `{key}` value on line {line_no}");

        match key {
            "youtube_api_url" => {
                cfg.youtube_api_url = Some(parse_string_literal(value).with_context(context)?);
            }
            "twitter_mirror_url" => {
                cfg.twitter_mirror_url = Some(parse_string_literal(value).with_context(context)?);
            }
            "instagram_mirror_url" => {
                cfg.instagram_mirror_url =
                    Some(parse_string_literal(value).with_context(context)?);
            }
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = Some(parse_integer_u64(value).with_context(context)?);
            }
            "read_timeout_secs" => {
                cfg.read_timeout_secs = Some(parse_integer_u64(value).with_context(context)?);
            }
            "download_read_timeout_secs" => {
                cfg.download_read_timeout_secs =
                    Some(parse_integer_u64(value).with_context(context)?);
            }
            "chunk_size" => {
                let parsed = parse_integer_u64(value).with_context(context)?;
                let size = usize::try_from(parsed)
                    .map_err(|_| anyhow::anyhow!("chunk_size out of range for usize"))
                    .with_context(context)?;
                cfg.chunk_size = Some(size);
            }
            "unknown_platform" => {
                let parsed = parse_string_literal(value).with_context(context)?;
                let policy = UnknownPlatformPolicy::parse(&parsed).with_context(|| {
                    format!(
                        "Invalid `unknown_platform` value '{parsed}' on line {line_no}. Expected one of: youtube, reject"
                    )
                })?;
                cfg.unknown_platform = Some(policy);
            }
            "output_dir" => {
                cfg.output_dir = Some(PathBuf::from(
                    parse_string_literal(value).with_context(context)?,
                ));
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}
