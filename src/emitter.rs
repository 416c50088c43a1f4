// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Writing rendered pages into a mirrored output tree.
//!
//! Output paths mirror the collection layout:
//!
//! | Input                  | Output               |
//! |------------------------|----------------------|
//! | collection root        | `README.md` (index)  |
//! | `<dir>/`               | `<dir>/README.md`    |
//! | `<dir>/<stem>.bru`     | `<dir>/<stem>.md`    |
//!
//! A request whose stem is `README` (any case) would land on its folder's
//! page, so it is written to `<dir>/<stem>.request.md` instead.
//!
//! Existing files are overwritten.

use crate::collection::{Collection, CollectionNode, Folder, RequestFile};
use crate::renderer::{self, RenderOptions};
use snafu::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

const FOLDER_PAGE_STEM: &str = "README";

/// Error type for output failures.
#[derive(Debug, Snafu)]
pub enum Error {
    /// An output directory could not be created.
    #[snafu(display("failed to create directory {}: {source}", path.display()))]
    CreateDir {
        /// The directory being created.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An output file could not be written.
    #[snafu(display("failed to write {}: {source}", path.display()))]
    WriteFile {
        /// The file being written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// A rendered page and where it belongs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    /// Path relative to the output root.
    pub path: PathBuf,
    /// The Markdown contents.
    pub contents: String,
}

/// Output path of a request's page, relative to the output root.
#[must_use]
pub fn request_doc_path(file: &RequestFile) -> PathBuf {
    let clashes_with_folder_page = file
        .path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| stem.eq_ignore_ascii_case(FOLDER_PAGE_STEM));
    if clashes_with_folder_page {
        file.path.with_extension("request.md")
    } else {
        file.path.with_extension("md")
    }
}

/// Output path of a folder's page, relative to the output root.
///
/// For the root folder this is the collection index.
#[must_use]
pub fn folder_doc_path(folder: &Folder) -> PathBuf {
    folder.path.join(format!("{FOLDER_PAGE_STEM}.md"))
}

/// Renders the page for a single node.
#[must_use]
pub fn render_node(node: &CollectionNode, opts: &RenderOptions) -> OutputFile {
    match node {
        CollectionNode::Folder(folder) => OutputFile {
            path: folder_doc_path(folder),
            contents: renderer::render_folder(folder, opts),
        },
        CollectionNode::Request(file) => OutputFile {
            path: request_doc_path(file),
            contents: renderer::render_request(&file.request, opts),
        },
    }
}

/// Lazily renders every page of a collection.
///
/// The index comes first, followed by one page per node in pre-order.
pub fn render_collection<'a>(
    collection: &'a Collection,
    opts: &'a RenderOptions,
) -> impl Iterator<Item = OutputFile> + 'a {
    std::iter::once_with(move || OutputFile {
        path: folder_doc_path(&collection.root),
        contents: renderer::render_index(collection, opts),
    })
    .chain(collection.nodes().map(move |node| render_node(node, opts)))
}

/// Writes one page below `out_root`, creating parent directories as needed.
///
/// Returns the full path written.
///
/// # Errors
///
/// Returns an error if a directory cannot be created or the file cannot be
/// written.
pub fn write_output(out_root: &Path, file: &OutputFile) -> Result<PathBuf, Error> {
    let path = out_root.join(&file.path);
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).context(CreateDirSnafu { path: parent })?;
    }
    fs::write(&path, &file.contents).context(WriteFileSnafu { path: &path })?;
    Ok(path)
}

/// Renders and writes the page for a single node.
///
/// # Errors
///
/// See [`write_output`].
pub fn emit_node(
    out_root: &Path,
    node: &CollectionNode,
    opts: &RenderOptions,
) -> Result<PathBuf, Error> {
    write_output(out_root, &render_node(node, opts))
}
