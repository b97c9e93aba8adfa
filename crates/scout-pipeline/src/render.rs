use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use scout_core::ContentDraft;

const MAX_SLUG_CHARS: usize = 60;

fn non_slug_chars() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^a-z0-9]+").ok()).as_ref()
}

/// Turns a content draft into a deliverable file.
///
/// Errors must propagate: a missing artifact after a create decision is a
/// data-integrity failure.
pub trait Renderer: Send + Sync {
    /// Render `draft` under `destination` (no extension) and return the path written.
    fn render(&self, draft: &ContentDraft, destination: &str) -> Result<PathBuf>;
}

/// `budget-planner-templates-20260301T120000` style file stem.
pub fn destination_name(trend: &str, at: DateTime<Utc>) -> String {
    let lowered = trend.to_lowercase();
    let slug = match non_slug_chars() {
        Some(pattern) => pattern.replace_all(&lowered, "-").into_owned(),
        None => lowered
            .chars()
            .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '-' })
            .collect(),
    };
    let mut slug: String = slug.trim_matches('-').chars().take(MAX_SLUG_CHARS).collect();
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("product");
    }
    format!("{slug}-{}", at.format("%Y%m%dT%H%M%S"))
}

/// Writes one Markdown document per product.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    output_dir: PathBuf,
    default_author: String,
}

impl MarkdownRenderer {
    pub fn new(output_dir: impl Into<PathBuf>, default_author: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            default_author: default_author.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn to_markdown(&self, draft: &ContentDraft) -> String {
        let author = if draft.author.is_empty() {
            self.default_author.as_str()
        } else {
            draft.author.as_str()
        };

        let mut blocks = vec![format!("# {}", draft.title)];
        if !draft.subtitle.is_empty() {
            blocks.push(format!("_{}_", draft.subtitle));
        }
        if !author.is_empty() {
            blocks.push(format!("By {author}"));
        }
        for section in &draft.sections {
            if !section.heading.is_empty() {
                blocks.push(format!("## {}", section.heading));
            }
            if !section.body.is_empty() {
                blocks.push(section.body.clone());
            }
        }

        let mut doc = blocks.join("\n\n");
        doc.push('\n');
        doc
    }

    /// First `<destination>[-n].md` that does not exist yet.
    fn free_path(&self, destination: &str) -> PathBuf {
        let first = self.output_dir.join(format!("{destination}.md"));
        if !first.exists() {
            return first;
        }
        (2..)
            .map(|n| self.output_dir.join(format!("{destination}-{n}.md")))
            .find(|path| !path.exists())
            .unwrap_or(first)
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, draft: &ContentDraft, destination: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!(
                "failed to create product dir: {}",
                self.output_dir.display()
            )
        })?;

        let path = self.free_path(destination);
        let tmp_path = path.with_extension("md.tmp");
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)
            .with_context(|| format!("failed to open product file: {}", tmp_path.display()))?;
        file.write_all(self.to_markdown(draft).as_bytes())
            .with_context(|| format!("failed to write product file: {}", tmp_path.display()))?;
        file.sync_all()
            .with_context(|| format!("failed to sync product file: {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &path)
            .with_context(|| format!("failed to finalize product file: {}", path.display()))?;

        tracing::info!(path = %path.display(), "rendered product");
        Ok(path)
    }
}
