use std::path::{Path, PathBuf};
use std::result::Result as StdResult;
use std::{sync::Arc, time::Duration};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::language::CommandLanguage;
use crate::sandbox::{Language, ProcessSandbox};
use crate::verdict::FeedbackType;

/// `glob::Pattern` that (de)serializes as its source string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GlobPattern(glob::Pattern);

impl GlobPattern {
    pub fn parse(pattern: &str) -> StdResult<Self, glob::PatternError> {
        glob::Pattern::new(pattern).map(Self)
    }

    pub fn matches(&self, filename: &str) -> bool {
        self.0.matches(filename)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for GlobPattern {
    type Error = glob::PatternError;

    fn try_from(s: String) -> StdResult<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<GlobPattern> for String {
    fn from(p: GlobPattern) -> Self {
        p.0.as_str().to_owned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(skip)]
    pub source_config_file: Option<PathBuf>,
    pub judge: JudgeConfig,
    #[serde(default, rename = "language")]
    pub languages: Vec<LanguageConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JudgeConfig {
    pub shell: PathBuf,
    pub compile_time_limit_ms: u64,
    #[serde(default)]
    pub feedback: String,
    /// Where work dirs are created. System temp dir if absent.
    pub work_root: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LanguageConfig {
    pub name: String,
    /// Source files this language is picked for.
    pub pattern: GlobPattern,
    pub source: String,
    /// Defaults to `source` (interpreted languages).
    pub artifact: Option<String>,
    pub compile: Option<String>,
    pub run: String,
}

impl Config {
    pub const FILENAME: &str = "saiten.toml";
    pub const APP_NAME: &str = "saiten";

    pub fn example_toml() -> &'static str {
        include_str!("../assets/saiten.toml")
    }

    pub fn from_toml(s: &str) -> StdResult<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn from_toml_file(filepath: PathBuf) -> anyhow::Result<Self> {
        let toml = fsutil::read_to_string(&filepath).context("Cannot read a file")?;
        let mut cfg = Self::from_toml(&toml)
            .with_context(|| format!("Invalid config TOML: {:?}", filepath))?;
        cfg.source_config_file = Some(filepath);
        Ok(cfg)
    }

    /// `<config dir>/saiten/saiten.toml`
    pub fn user_config_file() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(Self::APP_NAME).join(Self::FILENAME))
    }

    /// Find config file in ancestor dirs (including current dir), then in the user's config dir.
    pub fn find_file_in_ancestors(cur_dir: impl AsRef<Path>) -> anyhow::Result<PathBuf> {
        let cur_dir = cur_dir.as_ref();
        cur_dir
            .ancestors()
            .map(|dir| dir.join(Self::FILENAME))
            .chain(Self::user_config_file())
            .find(|path| path.is_file())
            .with_context(|| {
                format!(
                    "Cannot find '{}' (run `saiten init` to create one)",
                    Self::FILENAME
                )
            })
    }

    pub fn from_file_finding_in_ancestors(cur_dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config_filepath = Config::find_file_in_ancestors(cur_dir)?;
        log::debug!("Using config {:?}", config_filepath);
        Self::from_toml_file(config_filepath)
    }

    pub fn to_languages(&self) -> Vec<Arc<dyn Language>> {
        self.languages
            .iter()
            .map(|l| Arc::new(l.to_language()) as Arc<dyn Language>)
            .collect()
    }

    pub fn find_language_for_filename(&self, filename: impl AsRef<str>) -> Option<&LanguageConfig> {
        self.languages
            .iter()
            .find(|entry| entry.pattern.matches(filename.as_ref()))
    }

    pub fn find_language_by_name(&self, name: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|entry| entry.name == name)
    }
}

impl JudgeConfig {
    pub fn feedback_type(&self) -> FeedbackType {
        FeedbackType::from(self.feedback.as_str())
    }

    pub fn sandbox(&self) -> ProcessSandbox {
        let sandbox = ProcessSandbox::new()
            .shell(&self.shell)
            .compile_time_limit(Duration::from_millis(self.compile_time_limit_ms));
        match &self.work_root {
            Some(dir) => sandbox.work_root(dir),
            None => sandbox,
        }
    }
}

impl LanguageConfig {
    pub fn to_language(&self) -> CommandLanguage {
        match &self.compile {
            Some(compile) => CommandLanguage::compiled(
                &self.name,
                &self.source,
                self.artifact.as_ref().unwrap_or(&self.source),
                compile,
                &self.run,
            ),
            None => CommandLanguage::interpreted(&self.name, &self.source, &self.run),
        }
    }
}
