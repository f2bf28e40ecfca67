//! Preview and apply runs over a temporary source tree.
#![expect(clippy::unwrap_used, reason = "tests drive known-good sessions")]

use std::fs;

use tempfile::TempDir;
use typeswap::{RuleSet, Session, parse_config};

fn session(config_text: &str) -> Session {
    let config = parse_config(config_text).unwrap().config;
    let rules = RuleSet::compile(config.swap_value().unwrap(), config.line_map()).unwrap();
    Session::prepare(&config, rules).unwrap()
}

fn basic_config(dir: &TempDir) -> String {
    format!(
        "Folder = {}\nFiles = *.h\nSwap = {{\nOldT/NewT\n}}\n",
        dir.path().display()
    )
}

#[test]
fn a_preview_reports_without_touching_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a.h");
    fs::write(&path, "OldT value;\n").unwrap();
    let session = session(&basic_config(&dir));
    assert_eq!(session.targets(), [path.clone()]);
    let outcome = session.process_file(1, &path).unwrap();
    assert!(outcome.is_changed());
    assert_eq!(outcome.lines().len(), 1);
    assert_eq!(outcome.lines()[0].number(), 1);
    assert_eq!(fs::read_to_string(&path).unwrap(), "OldT value;\n");
}

#[test]
fn an_apply_rewrites_once_and_then_converges() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a.h");
    fs::write(&path, "OldT value;\n").unwrap();
    let session = session(&basic_config(&dir));
    let outcome = session.process_file(1, &path).unwrap();
    assert!(outcome.write().unwrap());
    assert_eq!(fs::read_to_string(&path).unwrap(), "NewT value;\n");
    let again = session.process_file(1, &path).unwrap();
    assert_eq!(again.replacement_count(), 0);
    assert!(!again.write().unwrap());
}

#[test]
fn exclude_globs_drop_discovered_files() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("keep.h"), "OldT a;\n").unwrap();
    fs::write(dir.path().join("skip_gen.h"), "OldT b;\n").unwrap();
    let config_text = format!(
        "Folder = {}\nFiles = *.h\nExcludeFile = *_gen.h\nSwap = {{\nOldT/NewT\n}}\n",
        dir.path().display()
    );
    let session = session(&config_text);
    assert_eq!(session.targets().len(), 1);
    assert!(session.targets()[0].ends_with("keep.h"));
}

#[test]
fn folders_keep_declaration_order() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("zz")).unwrap();
    fs::create_dir(dir.path().join("aa")).unwrap();
    fs::write(dir.path().join("zz/one.h"), "OldT a;\n").unwrap();
    fs::write(dir.path().join("aa/two.h"), "OldT b;\n").unwrap();
    let config_text = format!(
        "Folder = {0}/zz, {0}/aa\nFiles = *.h\nSwap = {{\nOldT/NewT\n}}\n",
        dir.path().display()
    );
    let session = session(&config_text);
    let names: Vec<&str> = session
        .targets()
        .iter()
        .filter_map(|path| path.file_name())
        .filter_map(|name| name.to_str())
        .collect();
    assert_eq!(names, vec!["one.h", "two.h"]);
}

#[test]
fn pointer_scans_never_mutate() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("p.h");
    fs::write(&path, "OldT* head;\nOldT plain;\n").unwrap();
    let session = session(&basic_config(&dir));
    let hits = session.scan_pointers(&path).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].number(), 1);
    assert_eq!(hits[0].source(), "OldT");
    assert_eq!(fs::read_to_string(&path).unwrap(), "OldT* head;\nOldT plain;\n");
}

#[test]
fn gated_folders_change_the_target_set() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("new")).unwrap();
    fs::create_dir(dir.path().join("old")).unwrap();
    fs::write(dir.path().join("new/a.h"), "OldT a;\n").unwrap();
    fs::write(dir.path().join("old/b.h"), "OldT b;\n").unwrap();
    let config_text = format!(
        "#define LAYOUT 2\n\
         #if LAYOUT == 2\n\
         Folder = {0}/new\n\
         #else\n\
         Folder = {0}/old\n\
         #endif\n\
         Files = *.h\n\
         Swap = {{\n\
         OldT/NewT\n\
         }}\n",
        dir.path().display()
    );
    let session = session(&config_text);
    assert_eq!(session.targets().len(), 1);
    assert!(session.targets()[0].ends_with("a.h"));
}
