use chrono::Utc;
use clap::{ArgAction, Parser};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::collect::{CollectOptions, collect_tree};
use crate::config::SiteConfig;
use crate::convert::{NbConvert, NotebookConverter};
use crate::domain::TreeNode;
use crate::error::{BuildError, Result};
use crate::fs::{copy_tree, prepare_output_dir, resolve_path};
use crate::template::{PageContext, check_template_dir, format_timestamp, render_pages, tree_json};

pub mod collect;
pub mod config;
pub mod convert;
pub mod domain;
pub mod error;
pub mod fs;
pub mod template;

#[derive(Parser, Debug)]
#[command(author, version, about = "Builds a static site from Jupyter notebooks and an HTML template", long_about = None)]
pub struct Args {
    /// Root of the repository holding the notebooks
    #[arg(long)]
    pub src: PathBuf,

    /// Path to the output directory
    #[arg(long)]
    pub out: PathBuf,

    /// Template directory (index.html plus optional pages, css/, assets/, js/)
    #[arg(long)]
    pub template: PathBuf,

    /// Site title [default: "Notebooks Tree — <src dir name>"]
    #[arg(long)]
    pub title: Option<String>,

    /// Execute notebooks before converting them
    #[arg(
        long,
        value_name = "true|false",
        action = ArgAction::Set,
        value_parser = parse_bool_flag,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true"
    )]
    pub execute: bool,

    /// YAML file overriding pages, asset dirs, ignored dirs and the converter
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Remove the output directory before building
    #[arg(long)]
    pub clean: bool,

    /// Log progress to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_bool_flag(value: &str) -> std::result::Result<bool, String> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(format!("expected `true` or `false`, got `{value}`"))
    }
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub src: PathBuf,
    pub out: PathBuf,
    pub template: PathBuf,
    pub title: Option<String>,
    pub execute: bool,
    pub clean: bool,
    pub config: SiteConfig,
}

impl BuildOptions {
    pub fn new(src: impl Into<PathBuf>, out: impl Into<PathBuf>, template: impl Into<PathBuf>) -> Self {
        BuildOptions {
            src: src.into(),
            out: out.into(),
            template: template.into(),
            title: None,
            execute: false,
            clean: false,
            config: SiteConfig::default(),
        }
    }
}

impl Args {
    pub fn into_options(self) -> Result<BuildOptions> {
        let config = SiteConfig::load_or_default(self.config.as_deref())?;
        Ok(BuildOptions {
            src: self.src,
            out: self.out,
            template: self.template,
            title: self.title,
            execute: self.execute,
            clean: self.clean,
            config,
        })
    }
}

#[derive(Debug)]
pub struct BuildSummary {
    pub out: PathBuf,
    pub nb_count: usize,
    pub pages: Vec<String>,
    pub tree: TreeNode,
}

pub fn default_title(src: &Path) -> String {
    let name = src
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("Notebooks Tree — {name}")
}

/// Builds the site with the converter described by `options.config`.
pub fn build_site(options: &BuildOptions) -> Result<BuildSummary> {
    let converter = NbConvert::new(options.config.converter.clone());
    build_site_with(options, &converter)
}

pub fn build_site_with(
    options: &BuildOptions,
    converter: &dyn NotebookConverter,
) -> Result<BuildSummary> {
    info!("Building site...");

    // Nothing may be written before the template is known to be usable
    check_template_dir(&options.template)?;

    let src = std::fs::canonicalize(&options.src).map_err(|e| BuildError::io(&options.src, e))?;
    let out = resolve_path(&options.out)?;
    if options.clean {
        let template = resolve_path(&options.template)?;
        prepare_output_dir(&out, &[src.as_path(), template.as_path()])?;
    }

    let collected = collect_tree(
        &CollectOptions {
            src: &src,
            out: &out,
            execute: options.execute,
            ignore: &options.config.ignore,
        },
        converter,
    )?;

    std::fs::create_dir_all(&out).map_err(|e| BuildError::io(&out, e))?;

    let context = PageContext {
        title: options.title.clone().unwrap_or_else(|| default_title(&src)),
        timestamp: format_timestamp(Utc::now()),
        nb_count: collected.nb_count,
        tree_json: tree_json(&collected.tree)?,
    };
    let pages = render_pages(&options.template, &out, &options.config.pages, &context)?;

    for asset_dir in &options.config.assets {
        copy_tree(&options.template.join(asset_dir), &out.join(asset_dir))?;
    }

    info!("Site built successfully.");
    Ok(BuildSummary {
        out,
        nb_count: collected.nb_count,
        pages,
        tree: collected.tree,
    })
}
