use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{BuildError, Result};

/// The one page a build cannot do without.
pub const INDEX_PAGE: &str = "index.html";

/// Site layout: which template pages are rendered, which asset directories are
/// copied and how notebooks are converted.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Rendered in order.
    pub pages: Vec<PageSpec>,
    pub assets: Vec<String>,
    /// Directory names skipped at any depth of the source walk.
    pub ignore: Vec<String>,
    pub converter: ConverterConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PageSpec {
    pub file: String,
    /// Whether `{{ TREE_JSON }}` is substituted in this page.
    #[serde(default)]
    pub tree: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    pub program: String,
    /// Arguments placed before the per-notebook ones.
    pub args: Vec<String>,
    pub embed_images: bool,
}

impl PageSpec {
    fn new(file: &str, tree: bool) -> Self {
        PageSpec {
            file: file.to_string(),
            tree,
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            pages: vec![
                PageSpec::new(INDEX_PAGE, false),
                PageSpec::new("software.html", true),
                PageSpec::new("publications.html", false),
                PageSpec::new("research.html", false),
            ],
            assets: vec!["css".into(), "assets".into(), "js".into()],
            ignore: Vec::new(),
            converter: ConverterConfig::default(),
        }
    }
}

impl Default for ConverterConfig {
    fn default() -> Self {
        ConverterConfig {
            program: "jupyter".into(),
            args: vec!["nbconvert".into()],
            embed_images: true,
        }
    }
}

impl SiteConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        Self::from_yaml(&raw).map_err(|source| BuildError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(raw: &str) -> std::result::Result<Self, serde_yaml::Error> {
        // An empty file is a valid "all defaults" config
        if raw.trim().is_empty() {
            return Ok(SiteConfig::default());
        }
        serde_yaml::from_str(raw)
    }

    /// `None` when no config file was given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(SiteConfig::default()),
        }
    }
}
