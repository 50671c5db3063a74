use clap::Parser;
use config::{
    Config as ConfigCrate, ConfigError as ConfigCrateError, Environment, File, Map, Source, Value,
};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::export::ExportKind;
use crate::render::MathJaxVersion;
use crate::svg::Rgb;

const DEFAULT_COPY_REDUCTION: f32 = 12.0;
const DEFAULT_DISPLAY_REDUCTION: f32 = 24.0;
const DEFAULT_VERTICAL_PADDING: u32 = 200;
const DEFAULT_RENDER_TIMEOUT_MS: u64 = 8000;
const DEFAULT_COMMIT_TIMEOUT_MS: u64 = 5000;
const DEFAULT_EXPORT_COLOR: &str = "black";
const DEFAULT_EXPORT_KIND: ExportKind = ExportKind::SourceText;
const DEFAULT_FOREGROUND: Rgb = Rgb(0xd0, 0xd0, 0xd0);
const DEFAULT_BACKGROUND: Rgb = Rgb(0x1c, 0x1c, 0x1c);
const DEFAULT_SELECTION_FOREGROUND: Rgb = Rgb(0x00, 0x00, 0x00);
const DEFAULT_SELECTION_BACKGROUND: Rgb = Rgb(0xd7, 0x87, 0x00);

pub const ENV_PREFIX: &str = "MATHMEMO";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file error: {0}")]
    ConfigFile(#[from] ConfigCrateError),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

// Every field optional so each layer only overrides what it sets.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
struct FileConfig {
    main: FileMain,
    display: FileDisplay,
    copy_image: FileCopyImage,
    render: FileRender,
    editor: FileEditor,
    export: FileExport,
    theme: FileTheme,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
struct FileMain {
    mathjax_version: Option<String>,
    mathjax_url: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
struct FileDisplay {
    reduction_factor: Option<f32>,
    vertical_padding: Option<u32>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
struct FileCopyImage {
    reduction_factor: Option<f32>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
struct FileRender {
    timeout_ms: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
struct FileEditor {
    commit_timeout_ms: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
struct FileExport {
    color: Option<String>,
    default: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
struct FileTheme {
    foreground: Option<String>,
    background: Option<String>,
    selection_foreground: Option<String>,
    selection_background: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MainSettings {
    pub mathjax_version: MathJaxVersion,
    pub mathjax_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySettings {
    pub reduction_factor: f32,
    pub vertical_padding: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CopyImageSettings {
    pub reduction_factor: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditorSettings {
    pub commit_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    pub color: String,
    pub default: ExportKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub foreground: Rgb,
    pub background: Rgb,
    pub selection_foreground: Rgb,
    pub selection_background: Rgb,
}

/// Resolved settings: defaults, then the config file, then environment
/// overrides, then command-line flags.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub filename: Option<PathBuf>,
    pub main: MainSettings,
    pub display: DisplaySettings,
    pub copy_image: CopyImageSettings,
    pub render: RenderSettings,
    pub editor: EditorSettings,
    pub export: ExportConfig,
    pub theme: Theme,
}

impl Default for AppConfig {
    fn default() -> Self {
        let version = MathJaxVersion::default();
        AppConfig {
            filename: None,
            main: MainSettings {
                mathjax_version: version,
                mathjax_url: version.default_url().to_string(),
            },
            display: DisplaySettings {
                reduction_factor: DEFAULT_DISPLAY_REDUCTION,
                vertical_padding: DEFAULT_VERTICAL_PADDING,
            },
            copy_image: CopyImageSettings {
                reduction_factor: DEFAULT_COPY_REDUCTION,
            },
            render: RenderSettings {
                timeout_ms: DEFAULT_RENDER_TIMEOUT_MS,
            },
            editor: EditorSettings {
                commit_timeout_ms: DEFAULT_COMMIT_TIMEOUT_MS,
            },
            export: ExportConfig {
                color: DEFAULT_EXPORT_COLOR.to_string(),
                default: DEFAULT_EXPORT_KIND,
            },
            theme: Theme {
                foreground: DEFAULT_FOREGROUND,
                background: DEFAULT_BACKGROUND,
                selection_foreground: DEFAULT_SELECTION_FOREGROUND,
                selection_background: DEFAULT_SELECTION_BACKGROUND,
            },
        }
    }
}

#[derive(Parser, Debug, Default)]
#[command(author, version, about = "LaTeX formula scratchpad for the terminal", long_about = None)]
pub struct CliArgs {
    /// Formula list to open
    pub filename: Option<PathBuf>,

    /// Path to a custom configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// MathJax generation, 2 or 3
    #[arg(long)]
    pub mathjax_version: Option<String>,
    /// Where the page loads MathJax from
    #[arg(long)]
    pub mathjax_url: Option<String>,
    #[arg(long)]
    pub display_reduction_factor: Option<f32>,
    #[arg(long)]
    pub vertical_padding: Option<u32>,
    #[arg(long)]
    pub copy_reduction_factor: Option<f32>,
    #[arg(long)]
    pub render_timeout_ms: Option<u64>,
    /// Export used by the plain copy key
    #[arg(long)]
    pub default_export: Option<String>,

    /// Print the resolved configuration and exit
    #[arg(long)]
    pub debug_config: bool,

    /// Run as the render host connected to SERVER
    #[arg(long, hide = true, value_name = "SERVER")]
    pub render_host: Option<String>,
}

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "mathmemo")
}

pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Loads configuration for `args`, taking overrides from `MATHMEMO__*`
/// environment variables.
pub fn load_config(args: &CliArgs) -> Result<AppConfig, ConfigError> {
    let env_source = Environment::with_prefix(ENV_PREFIX).separator("__");
    let env_map: Map<String, Value> = env_source.collect().unwrap_or_else(|_| Map::new());
    build_config(args, Some(env_map))
}

/// Builds the configuration from `args` and an explicit override source.
pub fn build_config(
    args: &CliArgs,
    override_source: Option<Map<String, Value>>,
) -> Result<AppConfig, ConfigError> {
    let config_file_path = args.config.clone().or_else(default_config_path);

    let mut config_builder = ConfigCrate::builder();
    if let Some(ref path) = config_file_path {
        config_builder = config_builder.add_source(File::from(path.clone()).required(false));
    }
    if let Some(overrides) = override_source {
        for (key, value) in overrides {
            config_builder = config_builder.set_override(&key, value)?;
        }
    }
    let loaded: FileConfig = config_builder.build()?.try_deserialize()?;

    let defaults = AppConfig::default();

    let mathjax_version = match args
        .mathjax_version
        .clone()
        .or(loaded.main.mathjax_version)
    {
        Some(raw) => raw.parse().map_err(ConfigError::ValidationError)?,
        None => defaults.main.mathjax_version,
    };
    let mathjax_url = args
        .mathjax_url
        .clone()
        .or(loaded.main.mathjax_url)
        .unwrap_or_else(|| mathjax_version.default_url().to_string());

    let default_export = match args.default_export.clone().or(loaded.export.default) {
        Some(raw) => raw.parse().map_err(ConfigError::ValidationError)?,
        None => defaults.export.default,
    };

    let colour = |raw: Option<String>, fallback: Rgb| -> Result<Rgb, ConfigError> {
        match raw {
            Some(raw) => raw.parse().map_err(ConfigError::ValidationError),
            None => Ok(fallback),
        }
    };

    let config = AppConfig {
        filename: args.filename.clone(),
        main: MainSettings {
            mathjax_version,
            mathjax_url,
        },
        display: DisplaySettings {
            reduction_factor: args
                .display_reduction_factor
                .or(loaded.display.reduction_factor)
                .unwrap_or(DEFAULT_DISPLAY_REDUCTION),
            vertical_padding: args
                .vertical_padding
                .or(loaded.display.vertical_padding)
                .unwrap_or(DEFAULT_VERTICAL_PADDING),
        },
        copy_image: CopyImageSettings {
            reduction_factor: args
                .copy_reduction_factor
                .or(loaded.copy_image.reduction_factor)
                .unwrap_or(DEFAULT_COPY_REDUCTION),
        },
        render: RenderSettings {
            timeout_ms: args
                .render_timeout_ms
                .or(loaded.render.timeout_ms)
                .unwrap_or(DEFAULT_RENDER_TIMEOUT_MS),
        },
        editor: EditorSettings {
            commit_timeout_ms: loaded
                .editor
                .commit_timeout_ms
                .unwrap_or(DEFAULT_COMMIT_TIMEOUT_MS),
        },
        export: ExportConfig {
            color: loaded
                .export
                .color
                .unwrap_or_else(|| DEFAULT_EXPORT_COLOR.to_string()),
            default: default_export,
        },
        theme: Theme {
            foreground: colour(loaded.theme.foreground, DEFAULT_FOREGROUND)?,
            background: colour(loaded.theme.background, DEFAULT_BACKGROUND)?,
            selection_foreground: colour(
                loaded.theme.selection_foreground,
                DEFAULT_SELECTION_FOREGROUND,
            )?,
            selection_background: colour(
                loaded.theme.selection_background,
                DEFAULT_SELECTION_BACKGROUND,
            )?,
        },
    };

    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let positive = [
        ("display.reduction_factor", config.display.reduction_factor),
        ("copy_image.reduction_factor", config.copy_image.reduction_factor),
    ];
    for (key, value) in positive {
        if value.is_nan() || value <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "{} must be positive, got {}",
                key, value
            )));
        }
    }
    if config.render.timeout_ms == 0 || config.editor.commit_timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "timeouts must be at least one millisecond".to_string(),
        ));
    }
    if config.export.color.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "export.color must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::ValueKind;
    use std::fs;
    use tempfile::TempDir;

    // Points at a file that does not exist so a real user config is ignored.
    fn isolated_args(dir: &TempDir, extra: &[&str]) -> CliArgs {
        let config_path = dir.path().join("config.toml");
        let mut cmd = vec![
            "mathmemo".to_string(),
            "--config".to_string(),
            config_path.to_string_lossy().into_owned(),
        ];
        cmd.extend(extra.iter().map(|s| s.to_string()));
        CliArgs::try_parse_from(cmd).expect("Failed to parse test args")
    }

    #[test]
    fn test_default_config() {
        let dir = TempDir::new().unwrap();
        let config = build_config(&isolated_args(&dir, &[]), None).unwrap();

        assert_eq!(config.copy_image.reduction_factor, 12.0);
        assert_eq!(config.display.reduction_factor, 24.0);
        assert_eq!(config.display.vertical_padding, 200);
        assert_eq!(config.main.mathjax_version, MathJaxVersion::V3);
        assert_eq!(config.main.mathjax_url, MathJaxVersion::V3.default_url());
        assert_eq!(config.export.default, ExportKind::SourceText);
        assert!(config.filename.is_none());
    }

    #[test]
    fn test_file_layer() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config.toml"),
            "[main]\nmathjax_version = \"2\"\n\n[display]\nvertical_padding = 50\n\n[theme]\nbackground = \"#000000\"\n",
        )
        .unwrap();
        let config = build_config(&isolated_args(&dir, &[]), None).unwrap();

        assert_eq!(config.main.mathjax_version, MathJaxVersion::V2);
        assert_eq!(config.main.mathjax_url, MathJaxVersion::V2.default_url());
        assert_eq!(config.display.vertical_padding, 50);
        assert_eq!(config.theme.background, Rgb(0, 0, 0));
        assert_eq!(config.display.reduction_factor, 24.0);
    }

    #[test]
    fn test_env_override() {
        let dir = TempDir::new().unwrap();
        let mut override_map = Map::new();
        override_map.insert(
            "display.vertical_padding".to_string(),
            Value::new(None, ValueKind::U64(5)),
        );
        override_map.insert(
            "export.default".to_string(),
            Value::new(None, ValueKind::String("raster".to_string())),
        );
        let config = build_config(&isolated_args(&dir, &[]), Some(override_map)).unwrap();

        assert_eq!(config.display.vertical_padding, 5);
        assert_eq!(config.export.default, ExportKind::Raster);
        assert_eq!(config.copy_image.reduction_factor, DEFAULT_COPY_REDUCTION);
    }

    #[test]
    fn test_arg_override() {
        let dir = TempDir::new().unwrap();
        let mut override_map = Map::new();
        override_map.insert(
            "copy_image.reduction_factor".to_string(),
            Value::new(None, ValueKind::Float(6.0)),
        );
        let args = isolated_args(
            &dir,
            &["formulas.tex", "--copy-reduction-factor=3", "--mathjax-url=file:///mj.js"],
        );
        let config = build_config(&args, Some(override_map)).unwrap();

        assert_eq!(config.filename, Some(PathBuf::from("formulas.tex")));
        assert_eq!(config.copy_image.reduction_factor, 3.0);
        assert_eq!(config.main.mathjax_url, "file:///mj.js");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let dir = TempDir::new().unwrap();
        let args = isolated_args(&dir, &["--display-reduction-factor=0"]);
        assert!(matches!(
            build_config(&args, None),
            Err(ConfigError::ValidationError(_))
        ));

        let args = isolated_args(&dir, &["--mathjax-version=4"]);
        assert!(matches!(
            build_config(&args, None),
            Err(ConfigError::ValidationError(_))
        ));

        fs::write(dir.path().join("config.toml"), "[theme]\nforeground = \"red\"\n").unwrap();
        assert!(build_config(&isolated_args(&dir, &[]), None).is_err());
    }
}
