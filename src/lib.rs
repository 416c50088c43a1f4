// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Convert Bruno API collections to Markdown documentation.
//!
//! A Bruno collection is a directory of `.bru` request definitions, with
//! sub-directories acting as folders. This crate:
//!
//! 1. Walks the collection and parses each request into typed Rust values
//! 2. Renders a Markdown page per request and per folder, plus an index
//! 3. Writes the pages into an output tree mirroring the collection
//!
//! # Example
//!
//! ```no_run
//! use bru2md::{collection, emitter, renderer::RenderOptions};
//! use std::path::Path;
//!
//! let collection = collection::load_collection(Path::new("my-api")).unwrap();
//! let opts = RenderOptions::default();
//!
//! for page in emitter::render_collection(&collection, &opts) {
//!     emitter::write_output(Path::new("docs"), &page).unwrap();
//! }
//! ```
//!
//! # Modules
//!
//! - [`parser`]: the `.bru` block format and request types
//! - [`collection`]: directory walking and the collection tree
//! - [`renderer`]: Markdown generation with configurable output options
//! - [`emitter`]: output paths and file writing

#![deny(missing_docs)]

pub mod collection;
pub mod emitter;
pub mod parser;
pub mod renderer;
