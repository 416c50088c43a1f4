// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Parsing for Bruno's `.bru` request files.
//!
//! A `.bru` file is a flat sequence of named blocks. Each block opens with
//! a `tag {` line at column 0 and closes with a `}` line at column 0:
//!
//! ```text
//! meta {
//!   name: List users
//!   seq: 1
//! }
//!
//! get {
//!   url: {{baseUrl}}/users
//!   body: none
//! }
//!
//! headers {
//!   Accept: application/json
//!   ~X-Debug: 1
//! }
//! ```
//!
//! Dictionary blocks hold `key: value` lines, where a leading `~` marks the
//! entry as disabled. Text blocks (`body:json`, `docs`, ...) hold free-form
//! content indented by two spaces.
//!
//! Only the fields needed for documentation are extracted. Scripts, tests,
//! assertions and variables are skipped.
//!
//! # Example
//!
//! ```
//! use bru2md::parser::{parse_request, Method};
//!
//! let bru = "meta {\n  name: Ping\n}\n\nget {\n  url: https://example.com/ping\n}\n";
//!
//! let request = parse_request(bru, "ping").unwrap();
//! assert_eq!(request.name, "Ping");
//! assert_eq!(request.method, Method::Get);
//! assert_eq!(request.url, "https://example.com/ping");
//! ```

use snafu::{OptionExt, prelude::*};
use std::fmt;

/// Error type for `.bru` parsing failures.
#[derive(Debug, Snafu)]
pub enum ParseError {
    /// A block was opened but the file ended before its closing brace.
    #[snafu(display("block `{tag}` opened on line {line} is never closed"))]
    UnterminatedBlock {
        /// The tag of the unclosed block.
        tag: String,
        /// The 1-based line number of the opening line.
        line: usize,
    },

    /// The file has no HTTP method block.
    #[snafu(display("no HTTP method block found"))]
    MissingMethod,

    /// The file has more than one HTTP method block.
    #[snafu(display("more than one HTTP method block ({first} and {second})"))]
    DuplicateMethod {
        /// The first method block found.
        first: Method,
        /// The second method block found.
        second: Method,
    },

    /// The method block has no `url` entry.
    #[snafu(display("{method} block has no `url` entry"))]
    MissingUrl {
        /// The method whose block lacks a URL.
        method: Method,
    },
}

/// An HTTP method, as named by a `.bru` method block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `get { ... }`
    Get,
    /// `post { ... }`
    Post,
    /// `put { ... }`
    Put,
    /// `patch { ... }`
    Patch,
    /// `delete { ... }`
    Delete,
    /// `options { ... }`
    Options,
    /// `head { ... }`
    Head,
    /// `connect { ... }`
    Connect,
    /// `trace { ... }`
    Trace,
}

impl Method {
    /// Returns the method for a block tag, or `None` if the tag is not a method.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "get" => Self::Get,
            "post" => Self::Post,
            "put" => Self::Put,
            "patch" => Self::Patch,
            "delete" => Self::Delete,
            "options" => Self::Options,
            "head" => Self::Head,
            "connect" => Self::Connect,
            "trace" => Self::Trace,
            _ => return None,
        })
    }

    /// Returns the upper-case method name (e.g., `"GET"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
            Self::Connect => "CONNECT",
            Self::Trace => "TRACE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A name/value entry from a dictionary block (headers, parameters, form fields).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// The entry name, without the `~` disabled marker.
    pub name: String,
    /// The entry value, verbatim.
    pub value: String,
    /// `false` when the entry was prefixed with `~`.
    pub enabled: bool,
}

/// Encoding of a form request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormEncoding {
    /// `application/x-www-form-urlencoded`
    UrlEncoded,
    /// `multipart/form-data`
    Multipart,
}

impl FormEncoding {
    /// Returns the Bru block suffix for this encoding.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UrlEncoded => "form-urlencoded",
            Self::Multipart => "multipart-form",
        }
    }
}

/// The body of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// A free-form body such as JSON, XML or plain text.
    Raw {
        /// The body kind from the block tag (e.g., `json`, `xml`, `graphql`).
        language: String,
        /// The body text with block indentation removed.
        content: String,
    },

    /// A form body made of name/value fields.
    Form {
        /// How the form is encoded.
        encoding: FormEncoding,
        /// The form fields in file order.
        fields: Vec<Param>,
    },
}

/// A parsed request definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Display name from `meta.name`, or the file stem when absent.
    pub name: String,
    /// Ordering key from `meta.seq`.
    pub seq: Option<u32>,
    /// The HTTP method.
    pub method: Method,
    /// The URL, verbatim (may contain `{{variables}}`).
    pub url: String,
    /// Auth mode (e.g., `bearer`), omitted for `none` and `inherit`.
    pub auth: Option<String>,
    /// Entries of the `params:path` block.
    pub path_params: Vec<Param>,
    /// Entries of the `params:query` block.
    pub query_params: Vec<Param>,
    /// Entries of the `headers` block.
    pub headers: Vec<Param>,
    /// The active request body, if any.
    pub body: Option<Body>,
    /// Contents of the `docs` block.
    pub docs: Option<String>,
}

/// Metadata from a `folder.bru` or `collection.bru` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderMeta {
    /// Display name from `meta.name`.
    pub name: Option<String>,
    /// Ordering key from `meta.seq`.
    pub seq: Option<u32>,
    /// Contents of the `docs` block.
    pub docs: Option<String>,
}

struct Block<'a> {
    tag: &'a str,
    lines: Vec<&'a str>,
}

impl Block<'_> {
    /// Interprets the block as `key: value` lines.
    fn pairs(&self) -> Vec<Param> {
        self.lines
            .iter()
            .filter_map(|line| {
                let (key, value) = line.trim().split_once(':')?;
                let key = key.trim();
                let (name, enabled) = key.strip_prefix('~').map_or((key, true), |k| (k, false));
                (!name.is_empty()).then(|| Param {
                    name: name.to_owned(),
                    value: value.trim().to_owned(),
                    enabled,
                })
            })
            .collect()
    }

    /// Returns the value of the first enabled entry named `key`.
    fn get(&self, key: &str) -> Option<String> {
        self.pairs()
            .into_iter()
            .find(|p| p.enabled && p.name == key)
            .map(|p| p.value)
    }

    /// Interprets the block as free-form text.
    fn text(&self) -> String {
        let lines: Vec<&str> = self
            .lines
            .iter()
            .map(|line| line.strip_prefix("  ").unwrap_or_else(|| line.trim_start()))
            .map(str::trim_end)
            .collect();

        let start = lines.iter().position(|l| !l.is_empty());
        let end = lines.iter().rposition(|l| !l.is_empty());
        match (start, end) {
            (Some(start), Some(end)) => lines[start..=end].join("\n"),
            _ => String::new(),
        }
    }
}

/// Recognizes a block opening line, returning its tag and whether it is
/// closed on the same line (`tag {}`).
fn block_header(line: &str) -> Option<(&str, bool)> {
    if line.starts_with(char::is_whitespace) {
        return None;
    }
    let (tag, closed) = match line.strip_suffix("{}") {
        Some(tag) => (tag, true),
        None => (line.strip_suffix('{')?, false),
    };
    let tag = tag.trim_end();
    (!tag.is_empty() && !tag.contains(char::is_whitespace)).then_some((tag, closed))
}

/// Splits a `.bru` document into its top-level blocks.
fn split_blocks(text: &str) -> Result<Vec<Block<'_>>, ParseError> {
    let mut blocks = Vec::new();
    let mut open: Option<(Block<'_>, usize)> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim_end();
        match open.take() {
            Some((block, _)) if line == "}" => blocks.push(block),
            Some((mut block, start)) => {
                block.lines.push(raw);
                open = Some((block, start));
            }
            None => {
                // Anything outside a block that is not a block header is ignored
                if let Some((tag, closed)) = block_header(line) {
                    let block = Block {
                        tag,
                        lines: Vec::new(),
                    };
                    if closed {
                        blocks.push(block);
                    } else {
                        open = Some((block, idx + 1));
                    }
                }
            }
        }
    }

    if let Some((block, line)) = open {
        return UnterminatedBlockSnafu {
            tag: block.tag,
            line,
        }
        .fail();
    }

    Ok(blocks)
}

fn find<'a, 'b>(blocks: &'b [Block<'a>], tag: &str) -> Option<&'b Block<'a>> {
    blocks.iter().find(|b| b.tag == tag)
}

fn pairs_of(blocks: &[Block<'_>], tags: &[&str]) -> Vec<Param> {
    tags.iter()
        .find_map(|tag| find(blocks, tag))
        .map(Block::pairs)
        .unwrap_or_default()
}

fn docs_of(blocks: &[Block<'_>]) -> Option<String> {
    find(blocks, "docs")
        .map(Block::text)
        .filter(|text| !text.is_empty())
}

fn meta_name(meta: Option<&Block<'_>>) -> Option<String> {
    meta.and_then(|m| m.get("name")).filter(|n| !n.is_empty())
}

fn meta_seq(meta: Option<&Block<'_>>) -> Option<u32> {
    meta.and_then(|m| m.get("seq"))
        .and_then(|seq| seq.parse().ok())
}

/// Maps a method block `body:` mode to the suffix of its `body:*` block.
fn body_suffix(mode: &str) -> &str {
    match mode {
        "formUrlEncoded" => "form-urlencoded",
        "multipartForm" => "multipart-form",
        other => other,
    }
}

/// Picks the active body block.
///
/// The method block's `body:` mode wins; `none` disables the body even when
/// a leftover `body:*` block is still present in the file.
fn select_body(blocks: &[Block<'_>], mode: Option<&str>) -> Option<Body> {
    let tag = match mode {
        Some("none") => return None,
        Some(mode) => format!("body:{}", body_suffix(mode)),
        None => blocks
            .iter()
            .map(|b| b.tag)
            .find(|tag| tag.starts_with("body:") && *tag != "body:graphql:vars")?
            .to_owned(),
    };
    let block = find(blocks, &tag)?;
    let kind = tag.strip_prefix("body:")?;

    let body = match kind {
        "form-urlencoded" | "multipart-form" => {
            let encoding = if kind == "form-urlencoded" {
                FormEncoding::UrlEncoded
            } else {
                FormEncoding::Multipart
            };
            Body::Form {
                encoding,
                fields: block.pairs(),
            }
        }
        _ => Body::Raw {
            language: kind.to_owned(),
            content: block.text(),
        },
    };

    match &body {
        Body::Raw { content, .. } if content.is_empty() => None,
        Body::Form { fields, .. } if fields.is_empty() => None,
        _ => Some(body),
    }
}

/// Parses the contents of a request `.bru` file.
///
/// # Arguments
///
/// * `text` - The raw file contents
/// * `fallback_name` - Name to use when the file has no `meta.name` (usually the file stem)
///
/// # Errors
///
/// Returns an error if a block is never closed, if the file has zero or
/// several HTTP method blocks, or if the method block has no `url` entry.
pub fn parse_request(text: &str, fallback_name: &str) -> Result<Request, ParseError> {
    let blocks = split_blocks(text)?;

    let mut methods = blocks
        .iter()
        .filter_map(|b| Method::from_tag(b.tag).map(|m| (m, b)));
    let (method, method_block) = methods.next().context(MissingMethodSnafu)?;
    if let Some((second, _)) = methods.next() {
        return DuplicateMethodSnafu {
            first: method,
            second,
        }
        .fail();
    }

    let url = method_block.get("url").context(MissingUrlSnafu { method })?;
    let auth = method_block
        .get("auth")
        .filter(|mode| !matches!(mode.as_str(), "" | "none" | "inherit"));
    let body = select_body(&blocks, method_block.get("body").as_deref());

    let meta = find(&blocks, "meta");

    Ok(Request {
        name: meta_name(meta).unwrap_or_else(|| fallback_name.to_owned()),
        seq: meta_seq(meta),
        method,
        url,
        auth,
        path_params: pairs_of(&blocks, &["params:path"]),
        // Older collections use a bare `query` block
        query_params: pairs_of(&blocks, &["params:query", "query"]),
        headers: pairs_of(&blocks, &["headers"]),
        body,
        docs: docs_of(&blocks),
    })
}

/// Parses the contents of a `folder.bru` or `collection.bru` file.
///
/// # Errors
///
/// Returns an error if a block is never closed.
pub fn parse_folder(text: &str) -> Result<FolderMeta, ParseError> {
    let blocks = split_blocks(text)?;
    let meta = find(&blocks, "meta");

    Ok(FolderMeta {
        name: meta_name(meta),
        seq: meta_seq(meta),
        docs: docs_of(&blocks),
    })
}
