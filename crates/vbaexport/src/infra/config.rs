//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".vbaexport/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub scan: Scan,
    #[serde(default)]
    pub host: Host,
    #[serde(default)]
    pub keybindings: Keybindings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Output {
    #[serde(default)]
    dir: Option<PathBuf>,
}

impl Output {
    fn default_dir() -> PathBuf {
        PathBuf::from("exported")
    }

    /// Output directory, possibly relative to the working directory.
    pub fn dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(Self::default_dir)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Scan {
    #[serde(default)]
    extension: Option<String>,
}

impl Scan {
    fn default_extension() -> &'static str {
        "xlsm"
    }

    pub fn extension(&self) -> String {
        self.extension
            .clone()
            .unwrap_or_else(|| Self::default_extension().to_owned())
    }
}

/// How the automation host is started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Host {
    #[serde(default)]
    prog_id: Option<String>,
    #[serde(default)]
    automation_security: Option<i32>,
}

impl Host {
    fn default_prog_id() -> &'static str {
        "Excel.Application"
    }

    fn default_automation_security() -> i32 {
        3
    }

    pub fn prog_id(&self) -> String {
        self.prog_id
            .clone()
            .unwrap_or_else(|| Self::default_prog_id().to_owned())
    }

    pub fn automation_security(&self) -> i32 {
        self.automation_security
            .unwrap_or_else(Self::default_automation_security)
    }
}

/// Extra keys for the selector; unset entries fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Keybindings {
    #[serde(default)]
    pub up: Option<String>,
    #[serde(default)]
    pub down: Option<String>,
    #[serde(default)]
    pub confirm: Option<String>,
    #[serde(default)]
    pub cancel: Option<String>,
}

impl Keybindings {
    pub fn up(&self) -> &str {
        self.up.as_deref().unwrap_or("k")
    }

    pub fn down(&self) -> &str {
        self.down.as_deref().unwrap_or("j")
    }

    pub fn confirm(&self) -> &str {
        self.confirm.as_deref().unwrap_or("enter")
    }

    pub fn cancel(&self) -> &str {
        self.cancel.as_deref().unwrap_or("q")
    }

    fn merge(self, other: Self) -> Self {
        Self {
            up: other.up.or(self.up),
            down: other.down.or(self.down),
            confirm: other.confirm.or(self.confirm),
            cancel: other.cancel.or(self.cancel),
        }
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    output_dir: Option<String>,
    prog_id: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            output_dir: env::var("VBAEXPORT_OUTPUT_DIR").ok(),
            prog_id: env::var("VBAEXPORT_PROG_ID").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(output_dir: &str, prog_id: &str) -> Self {
        Self {
            output_dir: Some(output_dir.to_owned()),
            prog_id: Some(prog_id.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            tracing::debug!(path = %global_path.display(), "loading user config");
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            tracing::debug!(path = %workspace_path.display(), "loading workspace config");
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            output: Output {
                dir: other.output.dir.or(self.output.dir),
            },
            scan: Scan {
                extension: other.scan.extension.or(self.scan.extension),
            },
            host: Host {
                prog_id: other.host.prog_id.or(self.host.prog_id),
                automation_security: other
                    .host
                    .automation_security
                    .or(self.host.automation_security),
            },
            keybindings: self.keybindings.merge(other.keybindings),
        }
    }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("vbaexport/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir().context("unable to determine working directory")?;
    Ok(Some(cwd.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(dir) = env.output_dir.filter(|dir| !dir.trim().is_empty()) {
        config.output.dir = Some(PathBuf::from(dir));
    }
    if let Some(prog_id) = env.prog_id.filter(|id| !id.trim().is_empty()) {
        config.host.prog_id = Some(prog_id);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_uses_defaults_when_no_files() {
        let config = Config::load_with_layers(None, None, EnvOverrides::default())
            .expect("load default config");
        assert_eq!(config.output.dir(), PathBuf::from("exported"));
        assert_eq!(config.scan.extension(), "xlsm");
        assert_eq!(config.host.prog_id(), "Excel.Application");
        assert_eq!(config.host.automation_security(), 3);
        assert_eq!(config.keybindings.up(), "k");
        assert_eq!(config.keybindings.down(), "j");
        assert_eq!(config.keybindings.confirm(), "enter");
        assert_eq!(config.keybindings.cancel(), "q");
    }

    #[test]
    fn merge_global_and_workspace() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let global = temp.path().join("config.toml");
        fs::write(
            &global,
            r#"
[output]
dir = "vba-src"
[host]
automation_security = 1
[keybindings]
up = "w"
"#,
        )?;

        let workspace = temp.path().join("workspace.toml");
        fs::write(
            &workspace,
            r#"
[scan]
extension = "xlam"
[keybindings]
down = "s"
"#,
        )?;

        let config =
            Config::load_with_layers(Some(global), Some(workspace), EnvOverrides::default())?;

        assert_eq!(config.output.dir(), PathBuf::from("vba-src"));
        assert_eq!(config.scan.extension(), "xlam");
        assert_eq!(config.host.prog_id(), "Excel.Application");
        assert_eq!(config.host.automation_security(), 1);
        assert_eq!(config.keybindings.up(), "w");
        assert_eq!(config.keybindings.down(), "s");
        assert_eq!(config.keybindings.confirm(), "enter");
        Ok(())
    }

    #[test]
    fn workspace_overrides_global_values() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let global = temp.path().join("global.toml");
        let workspace = temp.path().join("workspace.toml");
        fs::write(&global, "[output]\ndir = \"from-global\"\n")?;
        fs::write(&workspace, "[output]\ndir = \"from-workspace\"\n")?;

        let config =
            Config::load_with_layers(Some(global), Some(workspace), EnvOverrides::default())?;

        assert_eq!(config.output.dir(), PathBuf::from("from-workspace"));
        Ok(())
    }

    #[test]
    fn workspace_can_restore_a_default_key() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let global = temp.path().join("global.toml");
        let workspace = temp.path().join("workspace.toml");
        fs::write(&global, "[keybindings]\nup = \"w\"\ncancel = \"x\"\n")?;
        fs::write(&workspace, "[keybindings]\nup = \"k\"\n")?;

        let config =
            Config::load_with_layers(Some(global), Some(workspace), EnvOverrides::default())?;

        assert_eq!(config.keybindings.up(), "k");
        assert_eq!(config.keybindings.cancel(), "x");
        Ok(())
    }

    #[test]
    fn env_overrides_take_precedence() -> Result<()> {
        let overrides = EnvOverrides::for_tests("env-out", "Excel.Application.16");
        let config = Config::load_with_layers(None, None, overrides)?;
        assert_eq!(config.output.dir(), PathBuf::from("env-out"));
        assert_eq!(config.host.prog_id(), "Excel.Application.16");
        Ok(())
    }

    #[test]
    fn missing_layer_files_are_ignored() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config = Config::load_with_layers(
            Some(temp.path().join("nope.toml")),
            Some(temp.path().join("also-nope.toml")),
            EnvOverrides::default(),
        )?;
        assert_eq!(config.output.dir(), PathBuf::from("exported"));
        Ok(())
    }

    #[test]
    fn invalid_config_returns_error() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("broken.toml");
        fs::write(&file, "this is not toml")?;
        let result = Config::from_file(&file);
        assert!(result.is_err());
        Ok(())
    }
}
