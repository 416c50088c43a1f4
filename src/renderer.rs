// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Markdown rendering for parsed Bruno collections.
//!
//! Three kinds of pages are produced:
//!
//! - A request page per `.bru` file: method and URL, docs, auth mode,
//!   parameter and header tables, and the body
//! - A folder page per sub-folder: docs plus links to its requests and
//!   sub-folders
//! - A collection index: one heading per folder, nested to the folder's
//!   depth, each followed by links to that folder's requests
//!
//! # Example
//!
//! ```
//! use bru2md::parser::parse_request;
//! use bru2md::renderer::{render_request, RenderOptions};
//!
//! let request = parse_request("get {\n  url: https://example.com/users\n}\n", "users").unwrap();
//! let markdown = render_request(&request, &RenderOptions::default());
//!
//! assert!(markdown.starts_with("# users\n"));
//! assert!(markdown.contains("**`GET`** `https://example.com/users`"));
//! ```

use crate::collection::{Collection, CollectionNode, Folder, RequestFile};
use crate::emitter::{folder_doc_path, request_doc_path};
use crate::parser::{Body, Param, Request};
use std::fmt::Write;
use std::path::{Component, Path};

/// Configuration options for Markdown rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Number of heading levels to shift (0-5).
    ///
    /// A value of 0 gives each page an H1 title (default).
    /// A value of 1 starts at H2, useful for embedding.
    pub heading_offset: u8,

    /// Whether to list disabled (`~`-prefixed) parameters, headers and form
    /// fields.
    ///
    /// Disabled entries are shown with a struck-through name.
    pub show_disabled: bool,
}

/// Returns a markdown heading prefix with the given level and offset.
///
/// The heading level is clamped to a maximum of 6 (H6).
fn heading(level: usize, offset: u8) -> String {
    let actual = (level + usize::from(offset)).min(6);
    "#".repeat(actual)
}

/// Renders the documentation page for one request.
#[must_use]
pub fn render_request(req: &Request, opts: &RenderOptions) -> String {
    let mut out = String::new();
    writeln!(
        out,
        "{} {}\n",
        heading(1, opts.heading_offset),
        escape_xml_tags(&req.name)
    )
    .unwrap();

    if req.url.is_empty() {
        writeln!(out, "**{}**\n", code_span(req.method.as_str())).unwrap();
    } else {
        writeln!(
            out,
            "**{}** {}\n",
            code_span(req.method.as_str()),
            code_span(&req.url)
        )
        .unwrap();
    }

    if let Some(docs) = &req.docs {
        writeln!(out, "{docs}\n").unwrap();
    }

    if let Some(auth) = &req.auth {
        writeln!(out, "**Auth:** {}\n", code_span(auth)).unwrap();
    }

    render_params(&mut out, "Path Parameters", &req.path_params, opts);
    render_params(&mut out, "Query Parameters", &req.query_params, opts);
    render_params(&mut out, "Headers", &req.headers, opts);

    match &req.body {
        Some(Body::Raw { language, content }) => {
            writeln!(out, "{} Body\n", heading(2, opts.heading_offset)).unwrap();
            let content = if language == "json" {
                pretty_json(content).unwrap_or_else(|| content.clone())
            } else {
                content.clone()
            };
            let fence = code_fence(&content);
            writeln!(out, "{fence}{language}\n{content}\n{fence}\n").unwrap();
        }
        Some(Body::Form { encoding, fields }) => {
            let title = format!("Body ({})", encoding.as_str());
            render_params(&mut out, &title, fields, opts);
        }
        None => {}
    }

    finish(out)
}

/// Renders the documentation page for a sub-folder.
///
/// Links are relative to the folder's own page.
#[must_use]
pub fn render_folder(folder: &Folder, opts: &RenderOptions) -> String {
    let mut out = String::new();
    writeln!(
        out,
        "{} {}\n",
        heading(1, opts.heading_offset),
        escape_xml_tags(&folder.name)
    )
    .unwrap();

    if let Some(docs) = &folder.docs {
        writeln!(out, "{docs}\n").unwrap();
    }

    if folder.requests().next().is_some() {
        writeln!(out, "{} Requests\n", heading(2, opts.heading_offset)).unwrap();
        for file in folder.requests() {
            let target = request_doc_path(file);
            writeln!(out, "{}", request_link(file, relative_to(&target, &folder.path))).unwrap();
        }
        out.push('\n');
    }

    if folder.folders().next().is_some() {
        writeln!(out, "{} Folders\n", heading(2, opts.heading_offset)).unwrap();
        for sub in folder.folders() {
            let target = folder_doc_path(sub);
            writeln!(
                out,
                "- [{}]({})",
                escape_link_text(&sub.name),
                link_target(relative_to(&target, &folder.path))
            )
            .unwrap();
        }
        out.push('\n');
    }

    finish(out)
}

/// Renders the collection index.
///
/// Every folder gets a heading one level deeper than its nesting depth, so
/// top-level folders are H2, their sub-folders H3, and so on.
#[must_use]
pub fn render_index(collection: &Collection, opts: &RenderOptions) -> String {
    let mut out = String::new();
    writeln!(
        out,
        "{} API Documentation: {}\n",
        heading(1, opts.heading_offset),
        escape_xml_tags(&collection.name)
    )
    .unwrap();

    if let Some(docs) = &collection.root.docs {
        writeln!(out, "{docs}\n").unwrap();
    }

    render_request_links(&mut out, &collection.root);

    for folder in collection.nodes().filter_map(|node| match node {
        CollectionNode::Folder(folder) => Some(folder),
        CollectionNode::Request(_) => None,
    }) {
        writeln!(
            out,
            "{} [{}]({})\n",
            heading(folder.depth() + 1, opts.heading_offset),
            escape_link_text(&folder.name),
            link_target(&folder_doc_path(folder))
        )
        .unwrap();
        render_request_links(&mut out, folder);
    }

    finish(out)
}

/// Writes links (relative to the collection root) to a folder's requests.
fn render_request_links(out: &mut String, folder: &Folder) {
    let mut any_rendered = false;
    for file in folder.requests() {
        writeln!(out, "{}", request_link(file, &request_doc_path(file))).unwrap();
        any_rendered = true;
    }
    if any_rendered {
        out.push('\n');
    }
}

fn request_link(file: &RequestFile, target: &Path) -> String {
    format!(
        "- [{} {}]({})",
        code_span(file.request.method.as_str()),
        escape_link_text(&file.request.name),
        link_target(target)
    )
}

fn render_params(out: &mut String, title: &str, params: &[Param], opts: &RenderOptions) {
    let visible: Vec<&Param> = params
        .iter()
        .filter(|p| p.enabled || opts.show_disabled)
        .collect();
    if visible.is_empty() {
        return;
    }

    writeln!(out, "{} {title}\n", heading(2, opts.heading_offset)).unwrap();
    out.push_str("| Name | Value |\n");
    out.push_str("|------|-------|\n");
    for param in visible {
        let name = code_span(&escape_cell(&param.name));
        let name = if param.enabled {
            name
        } else {
            format!("~~{name}~~")
        };
        writeln!(out, "| {name} | {} |", escape_cell(&escape_xml_tags(&param.value))).unwrap();
    }
    out.push('\n');
}

/// Trims trailing blank lines so every page ends with exactly one newline.
fn finish(mut out: String) -> String {
    let len = out.trim_end().len();
    out.truncate(len);
    out.push('\n');
    out
}

/// Re-indents a JSON body with two spaces, keeping key order and the
/// literal text of every number.
///
/// Returns `None` when the body is not valid JSON (e.g., it contains
/// unquoted `{{variables}}`).
fn pretty_json(content: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(content).ok()?;
    serde_json::to_string_pretty(&value).ok()
}

/// Length of the longest run of consecutive backticks in `s`.
fn longest_backtick_run(s: &str) -> usize {
    s.split(|c| c != '`').map(str::len).max().unwrap_or(0)
}

/// Wraps `s` in an inline code span that reproduces it verbatim.
///
/// The delimiter is one backtick longer than any backtick run inside `s`,
/// and padded with spaces when `s` starts or ends with a backtick.
fn code_span(s: &str) -> String {
    let ticks = "`".repeat(longest_backtick_run(s) + 1);
    if s.starts_with('`') || s.ends_with('`') {
        format!("{ticks} {s} {ticks}")
    } else {
        format!("{ticks}{s}{ticks}")
    }
}

/// Returns a code fence longer than any backtick run in `content`.
fn code_fence(content: &str) -> String {
    "`".repeat(longest_backtick_run(content).max(2) + 1)
}

/// Escapes a value for use inside a Markdown table cell.
fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\r', '\n'], " ")
}

fn escape_link_text(s: &str) -> String {
    escape_xml_tags(&s.replace('[', "\\[").replace(']', "\\]"))
}

/// Expresses `target` relative to the directory `base`.
///
/// Both paths are relative to the output root and `base` is an ancestor of
/// `target`.
fn relative_to<'a>(target: &'a Path, base: &Path) -> &'a Path {
    target.strip_prefix(base).unwrap_or(target)
}

/// Formats a relative path as a Markdown link destination.
///
/// Separators are always `/`. Destinations containing spaces or parentheses
/// are wrapped in angle brackets.
fn link_target(path: &Path) -> String {
    let joined = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");

    if joined.contains(|c: char| c.is_whitespace() || c == '(' || c == ')') {
        format!("<{}>", joined.replace('<', "\\<").replace('>', "\\>"))
    } else {
        joined
    }
}

/// Escapes XML/HTML-like tags so they render literally in Markdown.
///
/// Uses HTML entities (`&lt;` `&gt;`) which are more reliably rendered across
/// markdown viewers. Only escapes `<` when followed by a letter, `/`, or `!`
/// to avoid false positives on comparisons like `x < 5`.
fn escape_xml_tags(s: &str) -> String {
    let mut result = String::with_capacity(s.len() * 2);
    let mut chars = s.chars().peekable();
    let mut in_tag = false;

    while let Some(c) = chars.next() {
        if c == '<' {
            let is_tag_start = chars
                .peek()
                .is_some_and(|&next| next.is_ascii_alphabetic() || next == '/' || next == '!');

            if is_tag_start {
                result.push_str("&lt;");
                in_tag = true;
            } else {
                result.push(c);
            }
        } else if c == '>' && in_tag {
            result.push_str("&gt;");
            in_tag = false;
        } else {
            result.push(c);
        }
    }

    result
}
