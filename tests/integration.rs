// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Integration tests for bru2md loading, rendering and writing.

use bru2md::{collection, emitter, renderer};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;
use walkdir::WalkDir;

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Builds a small but realistic collection.
fn sample_collection(root: &Path) {
    write(
        root,
        "bruno.json",
        r#"{ "version": "1", "name": "Pet Store", "type": "collection", "ignore": ["node_modules", ".git"] }"#,
    );
    write(root, "collection.bru", "docs {\n  The Pet Store API.\n}\n");
    write(
        root,
        "environments/local.bru",
        "vars {\n  baseUrl: http://localhost:3000\n}\n",
    );
    write(
        root,
        "health.bru",
        "meta {\n  name: Health check\n  type: http\n  seq: 1\n}\n\nget {\n  url: {{baseUrl}}/health\n  body: none\n  auth: none\n}\n",
    );
    write(
        root,
        "pets/folder.bru",
        "meta {\n  name: Pets\n  seq: 1\n}\n\ndocs {\n  Manage pets.\n}\n",
    );
    write(
        root,
        "pets/list-pets.bru",
        "meta {\n  name: List pets\n  seq: 1\n}\n\nget {\n  url: {{baseUrl}}/pets?limit=10\n  body: none\n  auth: bearer\n}\n\nparams:query {\n  limit: 10\n  ~tag: dog\n}\n\nheaders {\n  Accept: application/json\n}\n",
    );
    write(
        root,
        "pets/create-pet.bru",
        "meta {\n  name: Create pet\n  seq: 2\n}\n\npost {\n  url: {{baseUrl}}/pets\n  body: json\n  auth: bearer\n}\n\nbody:json {\n  {\n    \"name\": \"Rex\",\n    \"tag\": \"dog\"\n  }\n}\n",
    );
    write(
        root,
        "pets/photos/upload.bru",
        "meta {\n  name: Upload photo\n  seq: 1\n}\n\nput {\n  url: {{baseUrl}}/pets/:id/photo\n  body: multipartForm\n}\n\nparams:path {\n  id: 1\n}\n\nbody:multipart-form {\n  file: @file(rex.png)\n}\n",
    );
    write(root, "pets/photos/deep/deeper/ping.bru", "head {\n  url: /ping\n}\n");
}

/// Loads, renders and writes a collection, as the binary does.
fn convert(input: &Path, output: &Path) {
    let collection = collection::load_collection(input).unwrap();
    let opts = renderer::RenderOptions::default();
    for page in emitter::render_collection(&collection, &opts) {
        emitter::write_output(output, &page).unwrap();
    }
}

/// Runs the `bru2md` binary with the given arguments.
fn run_cli(args: &[&Path]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bru2md"))
        .args(args)
        .output()
        .expect("Failed to run bru2md")
}

/// Reads every file below `root` into a map keyed by relative path.
fn read_tree(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
            (rel, fs::read(e.path()).unwrap())
        })
        .collect()
}

/// Tests that the output tree mirrors the collection layout.
#[test]
fn writes_mirrored_tree() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    sample_collection(input.path());

    convert(input.path(), output.path());

    let files: Vec<_> = read_tree(output.path()).into_keys().collect();
    let expected: Vec<PathBuf> = [
        "README.md",
        "health.md",
        "pets/README.md",
        "pets/create-pet.md",
        "pets/list-pets.md",
        "pets/photos/README.md",
        "pets/photos/deep/README.md",
        "pets/photos/deep/deeper/README.md",
        "pets/photos/deep/deeper/ping.md",
        "pets/photos/upload.md",
    ]
    .iter()
    .map(PathBuf::from)
    .collect();

    assert_eq!(files, expected, "environments/ must not be documented");
}

/// Tests that every request page contains its method and URL verbatim.
#[test]
fn request_pages_contain_method_and_url() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    sample_collection(input.path());

    convert(input.path(), output.path());

    let collection = collection::load_collection(input.path()).unwrap();
    for node in collection.nodes() {
        if let collection::CollectionNode::Request(file) = node {
            let page = output.path().join(emitter::request_doc_path(file));
            let markdown = fs::read_to_string(&page).unwrap();
            assert!(
                markdown.contains(file.request.method.as_str()),
                "Missing method in {}",
                page.display()
            );
            assert!(
                markdown.contains(&file.request.url),
                "Missing URL in {}",
                page.display()
            );
        }
    }
}

/// Tests that index heading depth follows folder nesting depth.
#[test]
fn index_headings_follow_folder_depth() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    sample_collection(input.path());

    convert(input.path(), output.path());

    let index = fs::read_to_string(output.path().join("README.md")).unwrap();
    assert!(index.starts_with("# API Documentation: Pet Store\n\nThe Pet Store API.\n"));
    assert!(index.contains("\n## [Pets](pets/README.md)\n"));
    assert!(index.contains("\n### [photos](pets/photos/README.md)\n"));
    assert!(index.contains("\n#### [deep](pets/photos/deep/README.md)\n"));
    assert!(index.contains("\n##### [deeper](pets/photos/deep/deeper/README.md)\n"));
    assert!(index.contains("- [`HEAD` ping](pets/photos/deep/deeper/ping.md)"));
}

/// Tests that requests are listed in `seq` order.
#[test]
fn requests_listed_in_seq_order() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    sample_collection(input.path());

    convert(input.path(), output.path());

    let folder = fs::read_to_string(output.path().join("pets/README.md")).unwrap();
    let list = folder.find("List pets").unwrap();
    let create = folder.find("Create pet").unwrap();
    assert!(list < create);
    assert!(folder.contains("Manage pets."));
    assert!(folder.contains("- [photos](photos/README.md)"));
}

/// Tests the rendered content of individual request pages.
#[test]
fn renders_request_details() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    sample_collection(input.path());

    convert(input.path(), output.path());

    let list = fs::read_to_string(output.path().join("pets/list-pets.md")).unwrap();
    assert!(list.contains("**`GET`** `{{baseUrl}}/pets?limit=10`"));
    assert!(list.contains("**Auth:** `bearer`"));
    assert!(list.contains("| `limit` | 10 |"));
    assert!(!list.contains("`tag`"), "Disabled params hidden by default");
    assert!(list.contains("| `Accept` | application/json |"));

    let create = fs::read_to_string(output.path().join("pets/create-pet.md")).unwrap();
    assert!(create.contains("```json\n{\n  \"name\": \"Rex\",\n  \"tag\": \"dog\"\n}\n```"));

    let upload = fs::read_to_string(output.path().join("pets/photos/upload.md")).unwrap();
    assert!(upload.contains("## Path Parameters"));
    assert!(upload.contains("## Body (multipart-form)"));
    assert!(upload.contains("| `file` | @file(rex.png) |"));
}

/// Tests that converting unchanged input twice gives byte-identical output.
#[test]
fn output_is_stable_across_runs() {
    let input = TempDir::new().unwrap();
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    sample_collection(input.path());

    convert(input.path(), first.path());
    convert(input.path(), second.path());
    assert_eq!(read_tree(first.path()), read_tree(second.path()));

    // Re-running into an existing output overwrites in place
    let before = read_tree(first.path());
    convert(input.path(), first.path());
    assert_eq!(read_tree(first.path()), before);
}

/// Tests that a broken request file aborts with its path.
#[test]
fn malformed_request_names_file() {
    let input = TempDir::new().unwrap();
    sample_collection(input.path());
    write(input.path(), "pets/broken.bru", "meta {\n  name: Broken\n}\n\npost {\n  body: none\n}\n");

    let err = collection::load_collection(input.path()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("broken.bru"), "got: {message}");
    assert!(matches!(err, collection::Error::Format { .. }));
}

/// Tests that a missing collection root is reported.
#[test]
fn missing_collection_is_not_found() {
    let dir = TempDir::new().unwrap();
    let err = collection::load_collection(&dir.path().join("absent")).unwrap_err();
    assert!(matches!(err, collection::Error::NotFound { .. }));
}

/// Tests that a `README.bru` request never replaces the index or a folder page.
#[test]
fn readme_requests_keep_index_and_folder_pages() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    sample_collection(input.path());
    write(
        input.path(),
        "README.bru",
        "meta {\n  name: Readme req\n}\n\nget {\n  url: /readme\n}\n",
    );
    write(
        input.path(),
        "pets/README.bru",
        "meta {\n  name: Pets readme\n}\n\nget {\n  url: /pets/readme\n}\n",
    );

    convert(input.path(), output.path());

    let index = fs::read_to_string(output.path().join("README.md")).unwrap();
    assert!(index.starts_with("# API Documentation: Pet Store"));
    assert!(index.contains("- [`GET` Readme req](README.request.md)"));
    assert!(index.contains("\n## [Pets](pets/README.md)\n"));

    let pets = fs::read_to_string(output.path().join("pets/README.md")).unwrap();
    assert!(pets.starts_with("# Pets\n"));
    assert!(pets.contains("- [`GET` Pets readme](README.request.md)"));

    let readme_req = fs::read_to_string(output.path().join("README.request.md")).unwrap();
    assert!(readme_req.contains("**`GET`** `/readme`"));
    let pets_req = fs::read_to_string(output.path().join("pets/README.request.md")).unwrap();
    assert!(pets_req.contains("**`GET`** `/pets/readme`"));
}

/// Tests that the binary writes the tree and exits successfully.
#[test]
fn cli_converts_collection() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    sample_collection(input.path());

    let result = run_cli(&[input.path(), Path::new("-o"), output.path()]);

    assert!(result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("Wrote 10 files"), "got: {stderr}");
    assert!(output.path().join("pets/list-pets.md").is_file());
}

/// Tests that a bad request file fails the run and names the file.
#[test]
fn cli_reports_malformed_request() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    sample_collection(input.path());
    write(input.path(), "pets/broken.bru", "post {\n  body: none\n}\n");

    let result = run_cli(&[input.path(), Path::new("-o"), output.path()]);

    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("broken.bru"), "got: {stderr}");
    assert!(!output.path().join("README.md").exists());
}

/// Tests that a missing collection fails the run and names the path.
#[test]
fn cli_reports_missing_collection() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent-collection");

    let target = dir.path().join("out");

    let result = run_cli(&[missing.as_path(), Path::new("-o"), target.as_path()]);

    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("absent-collection"), "got: {stderr}");
}

/// Tests that dry-run writes nothing and summarises what it would write.
#[test]
fn cli_dry_run_writes_nothing() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let target = output.path().join("docs");
    sample_collection(input.path());

    let result = run_cli(&[input.path(), Path::new("-o"), target.as_path(), Path::new("-n")]);

    assert!(result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("Would write"), "got: {stderr}");
    assert!(stderr.contains("Would write 10 files"), "got: {stderr}");
    assert!(!target.exists());
}

/// Tests that quiet silences dry-run output as well.
#[test]
fn cli_quiet_dry_run_is_silent() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let target = output.path().join("docs");
    sample_collection(input.path());

    let result = run_cli(&[
        input.path(),
        Path::new("-o"),
        target.as_path(),
        Path::new("-n"),
        Path::new("-q"),
    ]);

    assert!(result.status.success());
    assert!(result.stderr.is_empty(), "got: {}", String::from_utf8_lossy(&result.stderr));
    assert!(!target.exists());
}
