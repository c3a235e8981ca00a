use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};

use nbsite::config::ConverterConfig;
use nbsite::convert::{ConversionJob, NotebookConverter};
use nbsite::domain::TreeNode;
use nbsite::error::{BuildError, Result};
use nbsite::{BuildOptions, build_site, build_site_with};
use pretty_assertions::assert_eq;

#[derive(Default)]
struct StubConverter {
    calls: Cell<usize>,
}

impl NotebookConverter for StubConverter {
    fn convert(&self, job: &ConversionJob) -> Result<()> {
        self.calls.set(self.calls.get() + 1);
        fs::write(&job.output, format!("<html>{}</html>", job.notebook.display()))
            .map_err(|e| BuildError::io(&job.output, e))
    }
}

struct Workspace {
    _tmp: tempfile::TempDir,
    src: PathBuf,
    out: PathBuf,
    template: PathBuf,
}

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn workspace() -> Workspace {
    let tmp = tempfile::tempdir().unwrap();
    let base = fs::canonicalize(tmp.path()).unwrap();
    let src = base.join("lab");
    let template = base.join("template");

    write(&src.join("a/b/nb1.ipynb"), "{}");
    write(&src.join("a/c/readme.md"), "# readme");
    write(&src.join("d/nb2.ipynb"), "{}");
    fs::create_dir_all(src.join("e")).unwrap();

    write(
        &template.join("index.html"),
        "<title>{{ TITLE }}</title><p>{{NBCOUNT}} notebooks, built {{ timestamp }}</p>",
    );
    write(
        &template.join("software.html"),
        "<script>window.TREE = {{ TREE_JSON }};</script>",
    );
    write(&template.join("research.html"), "{{ TREE_JSON }}");
    write(&template.join("css/site.css"), "body {}");
    write(&template.join("js/tree.js"), "console.log(1)");

    Workspace {
        out: base.join("site"),
        _tmp: tmp,
        src,
        template,
    }
}

fn options(ws: &Workspace) -> BuildOptions {
    BuildOptions::new(&ws.src, &ws.out, &ws.template)
}

#[test]
fn builds_full_site() {
    let ws = workspace();
    let converter = StubConverter::default();

    let summary = build_site_with(&options(&ws), &converter).unwrap();

    assert_eq!(summary.nb_count, 2);
    assert_eq!(converter.calls.get(), 2);
    assert_eq!(summary.out, ws.out);
    assert_eq!(summary.pages, vec!["index.html", "software.html", "research.html"]);

    let top: Vec<_> = summary.tree.children().iter().map(TreeNode::name).collect();
    assert_eq!(top, vec!["a", "d"]);

    assert!(ws.out.join("a/b/nb1.html").is_file());
    assert!(ws.out.join("d/nb2.html").is_file());
    assert!(!ws.out.join("a/c").exists());
    assert!(!ws.out.join("e").exists());
    assert!(!ws.out.join("publications.html").exists());

    let index = fs::read_to_string(ws.out.join("index.html")).unwrap();
    assert!(index.starts_with("<title>Notebooks Tree — lab</title><p>2 notebooks, built "));
    assert!(index.ends_with(" UTC</p>"));

    let software = fs::read_to_string(ws.out.join("software.html")).unwrap();
    let json = software
        .strip_prefix("<script>window.TREE = ")
        .and_then(|s| s.strip_suffix(";</script>"))
        .unwrap();
    let tree: TreeNode = serde_json::from_str(json).unwrap();
    assert_eq!(tree, summary.tree);

    // Not a tree page: the token stays as written
    assert_eq!(
        fs::read_to_string(ws.out.join("research.html")).unwrap(),
        "{{ TREE_JSON }}"
    );

    assert_eq!(fs::read_to_string(ws.out.join("css/site.css")).unwrap(), "body {}");
    assert!(ws.out.join("js/tree.js").is_file());
    assert!(!ws.out.join("assets").exists());
}

#[test]
fn missing_index_fails_before_any_output() {
    let ws = workspace();
    fs::remove_file(ws.template.join("index.html")).unwrap();
    let converter = StubConverter::default();

    let err = build_site_with(&options(&ws), &converter).unwrap_err();

    assert!(matches!(err, BuildError::MissingTemplate(_)));
    assert_eq!(converter.calls.get(), 0);
    assert!(!ws.out.exists());
}

#[test]
fn custom_title_is_escaped() {
    let ws = workspace();
    let mut opts = options(&ws);
    opts.title = Some("R&D <notebooks>".into());

    build_site_with(&opts, &StubConverter::default()).unwrap();

    let index = fs::read_to_string(ws.out.join("index.html")).unwrap();
    assert!(index.starts_with("<title>R&amp;D &lt;notebooks&gt;</title>"));
}

#[test]
fn rebuild_into_output_inside_source() {
    let ws = workspace();
    let mut opts = options(&ws);
    opts.out = ws.src.join("site");

    let first = build_site_with(&opts, &StubConverter::default()).unwrap();
    let second = build_site_with(&opts, &StubConverter::default()).unwrap();

    assert_eq!(first.nb_count, 2);
    assert_eq!(second.nb_count, 2);
    assert_eq!(first.tree, second.tree);
}

#[test]
fn clean_removes_stale_output() {
    let ws = workspace();
    write(&ws.out.join("stale.html"), "old");
    let mut opts = options(&ws);
    opts.clean = true;

    build_site_with(&opts, &StubConverter::default()).unwrap();

    assert!(!ws.out.join("stale.html").exists());
    assert!(ws.out.join("index.html").is_file());
}

#[test]
fn clean_refuses_output_holding_template() {
    let ws = workspace();
    let template = ws.out.join("template");
    write(&template.join("index.html"), "{{ TITLE }}");
    let mut opts = options(&ws);
    opts.template = template.clone();
    opts.clean = true;
    let converter = StubConverter::default();

    let err = build_site_with(&opts, &converter).unwrap_err();

    assert!(matches!(err, BuildError::UnsafeClean { ref inner, .. } if *inner == template));
    assert!(template.join("index.html").is_file());
    assert_eq!(converter.calls.get(), 0);
}

#[test]
fn timestamp_is_shared_by_all_pages() {
    let ws = workspace();
    write(&ws.template.join("index.html"), "{{ TIMESTAMP }}");
    write(&ws.template.join("publications.html"), "{{timestamp}}");
    write(&ws.template.join("research.html"), "{{ TimeStamp }}");

    build_site_with(&options(&ws), &StubConverter::default()).unwrap();

    let index = fs::read_to_string(ws.out.join("index.html")).unwrap();
    assert!(index.ends_with(" UTC"));
    for page in ["publications.html", "research.html"] {
        assert_eq!(fs::read_to_string(ws.out.join(page)).unwrap(), index, "{page}");
    }
}

#[test]
fn without_clean_old_files_stay() {
    let ws = workspace();
    write(&ws.out.join("stale.html"), "old");

    build_site_with(&options(&ws), &StubConverter::default()).unwrap();

    assert!(ws.out.join("stale.html").is_file());
}

#[test]
fn source_without_notebooks_builds_empty_tree() {
    let ws = workspace();
    fs::remove_file(ws.src.join("a/b/nb1.ipynb")).unwrap();
    fs::remove_file(ws.src.join("d/nb2.ipynb")).unwrap();

    let summary = build_site_with(&options(&ws), &StubConverter::default()).unwrap();

    assert_eq!(summary.nb_count, 0);
    assert!(summary.tree.children().is_empty());
    let software = fs::read_to_string(ws.out.join("software.html")).unwrap();
    assert_eq!(
        software,
        r#"<script>window.TREE = {"type":"dir","name":"lab","path":"","children":[]};</script>"#
    );
}

#[cfg(unix)]
fn shell_converter(script: &str) -> ConverterConfig {
    ConverterConfig {
        program: "sh".into(),
        args: vec!["-c".into(), script.into(), "nbconvert".into()],
        embed_images: true,
    }
}

/// Mimics nbconvert: writes `--output` into `--output-dir`.
#[cfg(unix)]
const FAKE_NBCONVERT: &str = r#"
name=; dir=; exec=no
while [ $# -gt 0 ]; do
  case "$1" in
    --output) name="$2"; shift ;;
    --output-dir) dir="$2"; shift ;;
    --execute) exec=yes ;;
  esac
  shift
done
printf 'execute=%s' "$exec" > "$dir/$name"
"#;

#[cfg(unix)]
#[test]
fn runs_external_converter() {
    let ws = workspace();
    let mut opts = options(&ws);
    opts.config.converter = shell_converter(FAKE_NBCONVERT);
    opts.execute = true;

    let summary = build_site(&opts).unwrap();

    assert_eq!(summary.nb_count, 2);
    assert_eq!(
        fs::read_to_string(ws.out.join("a/b/nb1.html")).unwrap(),
        "execute=yes"
    );
}

#[cfg(unix)]
#[test]
fn converter_failure_aborts_build() {
    let ws = workspace();
    let mut opts = options(&ws);
    opts.config.converter = shell_converter("exit 1");

    let err = build_site(&opts).unwrap_err();

    assert!(matches!(err, BuildError::Conversion { .. }));
    assert!(!ws.out.join("index.html").exists());
}
