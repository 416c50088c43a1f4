// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Loading a Bruno collection from disk.
//!
//! A collection is a directory tree. Each `.bru` file is a request, each
//! sub-directory is a folder, and a few well-known files carry metadata:
//!
//! - `bruno.json` at the root: collection name and ignore list
//! - `collection.bru` at the root: collection-level docs
//! - `folder.bru` in any folder: folder display name, ordering, docs
//!
//! The root-level `environments/` directory holds variable sets, not
//! requests, and is skipped along with `.git`, `node_modules`, and anything
//! named in the `bruno.json` ignore list.

use crate::parser::{self, Request};
use serde::Deserialize;
use snafu::{ensure, prelude::*};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

const ALWAYS_IGNORED: &[&str] = &[".git", "node_modules"];

/// Error type for collection loading failures.
#[derive(Debug, Snafu)]
pub enum Error {
    /// The collection root does not exist.
    #[snafu(display("collection not found: {}", path.display()))]
    NotFound {
        /// The missing root path.
        path: PathBuf,
    },

    /// The collection root is not a directory.
    #[snafu(display("collection root is not a directory: {}", path.display()))]
    NotADirectory {
        /// The offending root path.
        path: PathBuf,
    },

    /// A file could not be read.
    #[snafu(display("failed to read {}: {source}", path.display()))]
    ReadFile {
        /// The file being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// `bruno.json` is not valid JSON.
    #[snafu(display("failed to parse {}: {source}", path.display()))]
    Config {
        /// Path of the `bruno.json` file.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// A `.bru` file could not be parsed.
    #[snafu(display("failed to parse {}: {source}", path.display()))]
    Format {
        /// Path of the `.bru` file.
        path: PathBuf,
        /// The underlying parse error.
        source: parser::ParseError,
    },

    /// The directory walk failed.
    #[snafu(display("failed to walk collection: {source}"))]
    Walk {
        /// The underlying walk error, which names the path.
        source: walkdir::Error,
    },
}

/// The subset of `bruno.json` used for documentation.
#[derive(Debug, Default, Deserialize)]
struct CollectionConfig {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    ignore: Vec<String>,
}

/// A loaded collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    /// Collection name from `bruno.json`, or the root directory name.
    pub name: String,
    /// The root folder. Its `docs` come from `collection.bru`.
    pub root: Folder,
}

impl Collection {
    /// Iterates over every node below the root in pre-order.
    #[must_use]
    pub fn nodes(&self) -> Nodes<'_> {
        self.root.nodes()
    }
}

/// A node of the collection tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionNode {
    /// A directory of requests.
    Folder(Folder),
    /// A single request definition.
    Request(RequestFile),
}

impl CollectionNode {
    /// The node's path relative to the collection root.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Folder(folder) => &folder.path,
            Self::Request(file) => &file.path,
        }
    }

    /// Requests sort before folders; each group by `seq`, then file name.
    fn sort_key(&self) -> (u8, u32, &OsStr) {
        let (group, seq) = match self {
            Self::Request(file) => (0, file.request.seq),
            Self::Folder(folder) => (1, folder.seq),
        };
        (
            group,
            seq.unwrap_or(u32::MAX),
            self.path().file_name().unwrap_or_default(),
        )
    }
}

/// A folder of the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    /// Display name from `folder.bru`, or the directory name.
    pub name: String,
    /// Path relative to the collection root (empty for the root).
    pub path: PathBuf,
    /// Ordering key from `folder.bru`.
    pub seq: Option<u32>,
    /// Docs from `folder.bru` (or `collection.bru` for the root).
    pub docs: Option<String>,
    /// Requests first, then sub-folders, each ordered by `seq` and file name.
    pub children: Vec<CollectionNode>,
}

impl Folder {
    fn new(name: String, path: PathBuf) -> Self {
        Self {
            name,
            path,
            seq: None,
            docs: None,
            children: Vec::new(),
        }
    }

    /// Nesting depth below the collection root (the root itself is 0).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.path.components().count()
    }

    /// The requests directly inside this folder.
    pub fn requests(&self) -> impl Iterator<Item = &RequestFile> {
        self.children.iter().filter_map(|child| match child {
            CollectionNode::Request(file) => Some(file),
            CollectionNode::Folder(_) => None,
        })
    }

    /// The sub-folders directly inside this folder.
    pub fn folders(&self) -> impl Iterator<Item = &Folder> {
        self.children.iter().filter_map(|child| match child {
            CollectionNode::Folder(folder) => Some(folder),
            CollectionNode::Request(_) => None,
        })
    }

    /// Iterates over every node below this folder in pre-order.
    #[must_use]
    pub fn nodes(&self) -> Nodes<'_> {
        Nodes {
            stack: vec![self.children.iter()],
        }
    }

    /// Drops request-less sub-folders and orders children, bottom-up.
    fn finish(&mut self) {
        for child in &mut self.children {
            if let CollectionNode::Folder(folder) = child {
                folder.finish();
            }
        }
        self.children
            .retain(|child| !matches!(child, CollectionNode::Folder(f) if f.children.is_empty()));
        self.children.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    }
}

/// A request definition file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFile {
    /// Path of the `.bru` file relative to the collection root.
    pub path: PathBuf,
    /// The parsed request.
    pub request: Request,
}

/// Pre-order iterator over a folder's descendants.
///
/// Created by [`Folder::nodes`] and [`Collection::nodes`].
#[derive(Debug)]
pub struct Nodes<'a> {
    stack: Vec<std::slice::Iter<'a, CollectionNode>>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = &'a CollectionNode;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let level = self.stack.last_mut()?;
            match level.next() {
                Some(node) => {
                    if let CollectionNode::Folder(folder) = node {
                        self.stack.push(folder.children.iter());
                    }
                    return Some(node);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Loads the collection rooted at `root`.
///
/// # Errors
///
/// Returns an error if `root` does not exist or is not a directory, if
/// `bruno.json` is malformed, if any file cannot be read, or if a request
/// file lacks an HTTP method or URL.
///
/// # Example
///
/// ```no_run
/// use bru2md::collection::load_collection;
///
/// let collection = load_collection("my-api".as_ref()).unwrap();
/// for node in collection.nodes() {
///     println!("{}", node.path().display());
/// }
/// ```
pub fn load_collection(root: &Path) -> Result<Collection, Error> {
    ensure!(root.exists(), NotFoundSnafu { path: root });
    ensure!(root.is_dir(), NotADirectorySnafu { path: root });

    let config = read_config(root)?;
    let name = config
        .name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| root_dir_name(root));
    let mut ignore = config.ignore;
    ignore.extend(ALWAYS_IGNORED.iter().map(|&name| name.to_owned()));

    let mut root_folder = Folder::new(name.clone(), PathBuf::new());
    // Open folders below the root; `stack[i]` sits at depth `i + 1`
    let mut stack: Vec<Folder> = Vec::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_ignored(entry, &ignore));

    for entry in walker {
        let entry = entry.context(WalkSnafu)?;
        let depth = entry.depth();
        while stack.len() >= depth {
            close_folder(&mut stack, &mut root_folder);
        }

        let current = stack.last_mut().unwrap_or(&mut root_folder);
        let path = current.path.join(entry.file_name());

        if entry.file_type().is_dir() {
            let name = entry.file_name().to_string_lossy().into_owned();
            stack.push(Folder::new(name, path));
            continue;
        }

        if path.extension().is_none_or(|ext| ext != "bru") {
            continue;
        }

        let text = fs::read_to_string(entry.path()).context(ReadFileSnafu { path: entry.path() })?;
        let file_name = entry.file_name().to_string_lossy();

        if file_name == "folder.bru" || (depth == 1 && file_name == "collection.bru") {
            let meta = parser::parse_folder(&text).context(FormatSnafu { path: entry.path() })?;
            if let Some(name) = meta.name {
                // The root keeps the bruno.json name
                if depth > 1 {
                    current.name = name;
                }
            }
            current.seq = meta.seq.or(current.seq);
            current.docs = meta.docs.or(current.docs.take());
            continue;
        }

        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let request =
            parser::parse_request(&text, &stem).context(FormatSnafu { path: entry.path() })?;
        current
            .children
            .push(CollectionNode::Request(RequestFile { path, request }));
    }

    while !stack.is_empty() {
        close_folder(&mut stack, &mut root_folder);
    }
    root_folder.finish();

    Ok(Collection {
        name,
        root: root_folder,
    })
}

/// Pops the innermost open folder and attaches it to its parent.
fn close_folder(stack: &mut Vec<Folder>, root: &mut Folder) {
    if let Some(folder) = stack.pop() {
        let parent = stack.last_mut().unwrap_or(root);
        parent.children.push(CollectionNode::Folder(folder));
    }
}

fn is_ignored(entry: &DirEntry, ignore: &[String]) -> bool {
    let name = entry.file_name().to_string_lossy();
    if entry.depth() == 1 && entry.file_type().is_dir() && name == "environments" {
        return true;
    }
    ignore.iter().any(|ignored| ignored.as_str() == name)
}

fn read_config(root: &Path) -> Result<CollectionConfig, Error> {
    let path = root.join("bruno.json");
    if !path.is_file() {
        return Ok(CollectionConfig::default());
    }
    let json = fs::read_to_string(&path).context(ReadFileSnafu { path: &path })?;
    serde_json::from_str(&json).context(ConfigSnafu { path })
}

fn root_dir_name(root: &Path) -> String {
    root.canonicalize()
        .ok()
        .as_deref()
        .and_then(Path::file_name)
        .map_or_else(
            || "Collection".to_owned(),
            |name| name.to_string_lossy().into_owned(),
        )
}
