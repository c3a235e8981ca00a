//! Notebook to HTML conversion.
//!
//! Conversion is delegated to an external tool (`jupyter nbconvert` by
//! default). [`NotebookConverter`] is the seam the collector talks to, so the
//! walk can run against an in-process converter in tests.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::ConverterConfig;
use crate::error::{BuildError, Result};

/// One notebook to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub notebook: PathBuf,
    /// Full path of the HTML document to produce. Its parent exists.
    pub output: PathBuf,
    /// Run the cells before rendering instead of using saved outputs.
    pub execute: bool,
}

pub trait NotebookConverter {
    fn convert(&self, job: &ConversionJob) -> Result<()>;
}

/// Runs `<program> <args..> --to html ...` and waits for it to exit.
#[derive(Debug, Clone)]
pub struct NbConvert {
    config: ConverterConfig,
}

impl NbConvert {
    pub fn new(config: ConverterConfig) -> Self {
        NbConvert { config }
    }

    pub fn command(&self, job: &ConversionJob) -> Command {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.args).args(["--to", "html"]);
        if self.config.embed_images {
            cmd.arg("--HTMLExporter.embed_images=True");
        }
        let file_name = job.output.file_name().unwrap_or_default();
        let output_dir = job.output.parent().unwrap_or_else(|| Path::new("."));
        cmd.arg("--output")
            .arg(file_name)
            .arg("--output-dir")
            .arg(output_dir)
            .arg(&job.notebook);
        if job.execute {
            cmd.arg("--execute");
        }
        cmd
    }
}

impl Default for NbConvert {
    fn default() -> Self {
        NbConvert::new(ConverterConfig::default())
    }
}

impl NotebookConverter for NbConvert {
    fn convert(&self, job: &ConversionJob) -> Result<()> {
        let status = self
            .command(job)
            .status()
            .map_err(|source| BuildError::Spawn {
                program: self.config.program.clone(),
                source,
            })?;
        if !status.success() {
            return Err(BuildError::Conversion {
                notebook: job.notebook.clone(),
                status,
            });
        }
        Ok(())
    }
}
