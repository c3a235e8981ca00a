//! Token substitution for the template pages.
//!
//! Pages are plain HTML containing `{{ TOKEN }}` placeholders. Matching is
//! case-insensitive and ignores whitespace inside the braces. All tokens are
//! replaced in a single pass, so substituted values are never scanned again.

use chrono::{DateTime, Utc};
use regex::{Captures, Regex};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::config::{INDEX_PAGE, PageSpec};
use crate::domain::TreeNode;
use crate::error::{BuildError, Result};

static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\{\{\s*(TITLE|TIMESTAMP|NBCOUNT|TREE_JSON)\s*\}\}").unwrap()
});

/// Values shared by every page of one build.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub title: String,
    pub timestamp: String,
    pub nb_count: usize,
    /// Already escaped for embedding in `<script>`.
    pub tree_json: String,
}

#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

pub fn format_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// JSON for the tree with `</` written as `<\/` so a `</script>` inside a
/// file name cannot close the surrounding script element.
pub fn tree_json(tree: &TreeNode) -> Result<String> {
    Ok(serde_json::to_string(tree)?.replace("</", "<\\/"))
}

/// Substitutes the tokens in `src`. `{{ TREE_JSON }}` is only replaced when
/// `with_tree` is set; otherwise it is left as written.
pub fn render_tokens(src: &str, context: &PageContext, with_tree: bool) -> String {
    let title = escape_html(&context.title);
    let nb_count = context.nb_count.to_string();
    TOKEN_PATTERN
        .replace_all(src, |caps: &Captures<'_>| {
            match caps[1].to_ascii_uppercase().as_str() {
                "TITLE" => title.clone(),
                "TIMESTAMP" => context.timestamp.clone(),
                "NBCOUNT" => nb_count.clone(),
                "TREE_JSON" if with_tree => context.tree_json.clone(),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Fails when the template directory has no `index.html`.
pub fn check_template_dir(template_dir: &Path) -> Result<()> {
    let index_path = template_dir.join(INDEX_PAGE);
    if !index_path.is_file() {
        return Err(BuildError::MissingTemplate(index_path));
    }
    Ok(())
}

/// Renders every page of `pages` that exists in `template_dir` into
/// `output_dir` and returns the names written.
pub fn render_pages(
    template_dir: &Path,
    output_dir: &Path,
    pages: &[PageSpec],
    context: &PageContext,
) -> Result<Vec<String>> {
    let mut written = Vec::new();
    for page in pages {
        let page_path = template_dir.join(&page.file);
        if !page_path.is_file() {
            debug!(page = %page.file, "Template page not found, skipping");
            continue;
        }
        let src_html = fs::read_to_string(&page_path).map_err(|e| BuildError::io(&page_path, e))?;
        let html_doc = render_tokens(&src_html, context, page.tree);

        let out_path = output_dir.join(&page.file);
        fs::write(&out_path, html_doc).map_err(|e| BuildError::io(&out_path, e))?;
        info!(page = %page.file, "Wrote page");
        written.push(page.file.clone());
    }
    Ok(written)
}
