//! Deferred image loading rewrite
//!
//! Only `<img>` start tags are touched. Inside each one:
//! - `loading="lazy"` is dropped
//! - `data-src` replaces `src` (or becomes `src` if there is none)
//! - `data-srcset` replaces `srcset` the same way
//!
//! Everything outside the rewritten tags is copied byte-for-byte, and a tag
//! that needs no change is copied verbatim too.

use crate::postprocess::{PostprocessError, PostprocessResult};
use regex::Regex;
use std::path::Path;

/// An `<img ...>` start tag; quoted values may contain `>`
const IMG_TAG_PATTERN: &str = r#"(?i)<img\b(?:[^>"']|"[^"]*"|'[^']*')*>"#;

/// One attribute with its leading whitespace and optional value
const ATTRIBUTE_PATTERN: &str =
    r#"(\s+)([^\s"'>/=]+)(?:(\s*=\s*)("[^"]*"|'[^']*'|[^\s"'=<>`]+))?"#;

/// Counters for one rewrite
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    /// `<img>` tags seen
    pub images: usize,

    /// `<img>` tags that were changed
    pub images_changed: usize,

    pub lazy_removed: usize,
    pub src_promoted: usize,
    pub srcset_promoted: usize,
}

impl RewriteStats {
    pub fn is_unchanged(&self) -> bool {
        self.images_changed == 0
    }

    /// Adds another file's counters to this one
    pub fn merge(&mut self, other: &RewriteStats) {
        self.images += other.images;
        self.images_changed += other.images_changed;
        self.lazy_removed += other.lazy_removed;
        self.src_promoted += other.src_promoted;
        self.srcset_promoted += other.srcset_promoted;
    }
}

#[derive(Debug, Clone)]
struct Attribute {
    lead: String,
    name: String,
    assign: String,
    value: Option<String>,
}

impl Attribute {
    /// Value without surrounding quotes
    fn unquoted(&self) -> Option<&str> {
        let value = self.value.as_deref()?;
        let stripped = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')));
        Some(stripped.unwrap_or(value))
    }
}

#[derive(Debug, Clone)]
enum Segment {
    Raw(String),
    Attr(Attribute),
}

impl Segment {
    fn is_named(&self, name: &str) -> bool {
        matches!(self, Segment::Attr(attr) if attr.name.eq_ignore_ascii_case(name))
    }

    fn write_to(&self, out: &mut String) {
        match self {
            Segment::Raw(text) => out.push_str(text),
            Segment::Attr(attr) => {
                out.push_str(&attr.lead);
                out.push_str(&attr.name);
                if let Some(value) = &attr.value {
                    out.push_str(&attr.assign);
                    out.push_str(value);
                }
            }
        }
    }
}

/// Rewrites deferred image attributes to eager ones
#[derive(Debug, Clone)]
pub struct LazyImageRewriter {
    img_tag: Regex,
    attribute: Regex,
}

impl LazyImageRewriter {
    pub fn new() -> PostprocessResult<Self> {
        Ok(Self {
            img_tag: Regex::new(IMG_TAG_PATTERN)?,
            attribute: Regex::new(ATTRIBUTE_PATTERN)?,
        })
    }

    /// Rewrites every `<img>` tag in `html`
    pub fn rewrite(&self, html: &str) -> (String, RewriteStats) {
        let mut stats = RewriteStats::default();
        let mut out = String::with_capacity(html.len());
        let mut last = 0;

        for tag in self.img_tag.find_iter(html) {
            stats.images += 1;
            out.push_str(&html[last..tag.start()]);

            match self.rewrite_tag(tag.as_str(), &mut stats) {
                Some(rewritten) => {
                    stats.images_changed += 1;
                    out.push_str(&rewritten);
                }
                None => out.push_str(tag.as_str()),
            }
            last = tag.end();
        }
        out.push_str(&html[last..]);

        (out, stats)
    }

    /// Returns the rewritten tag, or `None` if it needs no change
    fn rewrite_tag(&self, tag: &str, stats: &mut RewriteStats) -> Option<String> {
        // "<img" is ASCII whatever its case
        let (head, rest) = tag.split_at(4);
        let inner = rest.strip_suffix('>')?;

        let mut segments = Vec::new();
        let mut last = 0;
        for caps in self.attribute.captures_iter(inner) {
            let whole = caps.get(0)?;
            if whole.start() > last {
                segments.push(Segment::Raw(inner[last..whole.start()].to_string()));
            }
            segments.push(Segment::Attr(Attribute {
                lead: caps.get(1).map_or("", |m| m.as_str()).to_string(),
                name: caps.get(2).map_or("", |m| m.as_str()).to_string(),
                assign: caps.get(3).map_or("", |m| m.as_str()).to_string(),
                value: caps.get(4).map(|m| m.as_str().to_string()),
            }));
            last = whole.end();
        }
        if last < inner.len() {
            segments.push(Segment::Raw(inner[last..].to_string()));
        }

        let mut changed = false;

        let before = segments.len();
        segments.retain(|s| {
            !matches!(s, Segment::Attr(attr)
                if attr.name.eq_ignore_ascii_case("loading") && attr.unquoted() == Some("lazy"))
        });
        if segments.len() != before {
            stats.lazy_removed += 1;
            changed = true;
        }

        if promote_all(&mut segments, "data-src", "src") {
            stats.src_promoted += 1;
            changed = true;
        }
        if promote_all(&mut segments, "data-srcset", "srcset") {
            stats.srcset_promoted += 1;
            changed = true;
        }

        if !changed {
            return None;
        }

        let mut out = String::with_capacity(tag.len());
        out.push_str(head);
        for segment in &segments {
            segment.write_to(&mut out);
        }
        out.push('>');
        Some(out)
    }

    /// Rewrites one file, in place when `output` is `None`
    pub fn rewrite_file(&self, input: &Path, output: Option<&Path>) -> PostprocessResult<RewriteStats> {
        let html = std::fs::read_to_string(input).map_err(|source| PostprocessError::Read {
            path: input.to_path_buf(),
            source,
        })?;

        let (rewritten, stats) = self.rewrite(&html);

        if output.is_none() && stats.is_unchanged() {
            tracing::debug!("No deferred images in {}", input.display());
            return Ok(stats);
        }

        let target = output.unwrap_or(input);
        std::fs::write(target, rewritten).map_err(|source| PostprocessError::Write {
            path: target.to_path_buf(),
            source,
        })?;

        tracing::info!(
            "Rewrote {} ({} of {} images changed)",
            target.display(),
            stats.images_changed,
            stats.images
        );
        Ok(stats)
    }
}

/// Moves every `from` attribute onto `to`
///
/// An existing `to` attribute keeps its position and takes the new value;
/// otherwise `from` is renamed in place.
fn promote_all(segments: &mut Vec<Segment>, from: &str, to: &str) -> bool {
    let mut promoted = false;

    while let Some(idx) = segments.iter().position(|s| s.is_named(from)) {
        let Segment::Attr(source) = segments.remove(idx) else {
            break;
        };
        promoted = true;

        let value = source.value.unwrap_or_else(|| "\"\"".to_string());
        let assign = if source.assign.is_empty() {
            "=".to_string()
        } else {
            source.assign
        };

        match segments.iter_mut().find(|s| s.is_named(to)) {
            Some(Segment::Attr(target)) => {
                if target.value.is_none() {
                    target.assign = assign;
                }
                target.value = Some(value);
            }
            _ => segments.insert(
                idx,
                Segment::Attr(Attribute {
                    lead: source.lead,
                    name: to.to_string(),
                    assign,
                    value: Some(value),
                }),
            ),
        }
    }

    promoted
}

/// Rewrites the deferred images in an HTML string
pub fn rewrite_lazy_images(html: &str) -> PostprocessResult<(String, RewriteStats)> {
    Ok(LazyImageRewriter::new()?.rewrite(html))
}

/// Rewrites one file, overwriting it when no output path is given
pub fn rewrite_file(input: &Path, output: Option<&Path>) -> PostprocessResult<RewriteStats> {
    LazyImageRewriter::new()?.rewrite_file(input, output)
}
