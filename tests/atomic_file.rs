//! Atomic file replace: install/discard behavior, overwrite policy, and
//! staging hygiene.

use std::io::Write;
use std::path::Path;

use stagecraft::{
    with_file_stage, write_file_atomic, Error, FileStage, Overwrite, StageOptions,
};

/// Names currently present in `dir`, sorted.
fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn writes_new_file_and_leaves_no_staging_residue() {
    let td = tempfile::tempdir().unwrap();
    let dest = td.path().join("out.txt");

    write_file_atomic(&dest, b"hello", StageOptions::default()).unwrap();

    assert_eq!(std::fs::read(&dest).unwrap(), b"hello");
    assert_eq!(entries(td.path()), vec!["out.txt"], "only the destination remains");
}

#[test]
fn staging_file_is_a_hidden_sibling_of_the_destination() {
    let td = tempfile::tempdir().unwrap();
    let dest = td.path().join("out.txt");

    let stage = FileStage::begin(&dest, StageOptions::default()).unwrap();
    assert_eq!(stage.path().parent(), dest.parent());
    let name = stage.path().file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with('.') && name.ends_with(".tmp"), "got {name}");
}

#[test]
fn replace_overwrites_existing_destination() {
    let td = tempfile::tempdir().unwrap();
    let dest = td.path().join("out.txt");
    std::fs::write(&dest, b"old").unwrap();

    let opts = StageOptions::default().overwrite(Overwrite::Replace);
    write_file_atomic(&dest, b"new", opts).unwrap();

    assert_eq!(std::fs::read(&dest).unwrap(), b"new");
    assert_eq!(entries(td.path()), vec!["out.txt"]);
}

#[test]
fn forbid_fails_with_path_exists_and_keeps_prior_content() {
    let td = tempfile::tempdir().unwrap();
    let dest = td.path().join("out.txt");
    std::fs::write(&dest, b"old").unwrap();

    let err = write_file_atomic(&dest, b"new", StageOptions::default()).unwrap_err();
    assert!(matches!(err, Error::PathExists { .. }), "got {err}");

    assert_eq!(std::fs::read(&dest).unwrap(), b"old");
    assert_eq!(entries(td.path()), vec!["out.txt"], "staging file was discarded");
}

#[test]
fn forbid_existence_check_happens_at_install_time() {
    let td = tempfile::tempdir().unwrap();
    let dest = td.path().join("out.txt");

    // Destination appears after staging starts; install must still fail.
    let mut stage = FileStage::begin(&dest, StageOptions::default()).unwrap();
    stage.write_all(b"staged").unwrap();
    std::fs::write(&dest, b"raced-in").unwrap();

    let err = stage.commit().unwrap_err();
    assert!(matches!(err, Error::PathExists { .. }), "got {err}");
    assert_eq!(std::fs::read(&dest).unwrap(), b"raced-in");
    assert_eq!(entries(td.path()), vec!["out.txt"]);
}

#[test]
fn populate_error_discards_staging_and_destination_is_untouched() {
    let td = tempfile::tempdir().unwrap();
    let dest = td.path().join("out.txt");
    std::fs::write(&dest, b"old").unwrap();

    let opts = StageOptions::default().overwrite(Overwrite::Replace);
    let res: stagecraft::Result<()> = with_file_stage(&dest, opts, |stage| {
        stage.write_all(b"partial")?;
        Err(Error::Io(std::io::Error::other("simulated writer failure")))
    });
    assert!(res.is_err());

    assert_eq!(std::fs::read(&dest).unwrap(), b"old");
    assert_eq!(entries(td.path()), vec!["out.txt"], "no staging residue after failure");
}

#[test]
fn missing_parent_directory_is_not_found() {
    let td = tempfile::tempdir().unwrap();
    let dest = td.path().join("missing").join("out.txt");

    let err = write_file_atomic(&dest, b"x", StageOptions::default()).unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }), "got {err}");
}

#[test]
fn destination_must_not_be_a_directory() {
    let td = tempfile::tempdir().unwrap();
    let dest = td.path().join("dir");
    std::fs::create_dir(&dest).unwrap();

    assert!(FileStage::begin(&dest, StageOptions::default()).is_err());
}

#[test]
fn repeated_replace_is_idempotent() {
    let td = tempfile::tempdir().unwrap();
    let dest = td.path().join("out.txt");

    let opts = StageOptions::default().overwrite(Overwrite::Replace);
    for _ in 0..3 {
        write_file_atomic(&dest, b"same bytes", opts).unwrap();
    }
    assert_eq!(std::fs::read(&dest).unwrap(), b"same bytes");
}

#[test]
fn skip_sync_still_installs_atomically() {
    let td = tempfile::tempdir().unwrap();
    let dest = td.path().join("out.txt");

    let opts = StageOptions::default()
        .overwrite(Overwrite::Replace)
        .skip_sync(true);
    write_file_atomic(&dest, b"fast path", opts).unwrap();
    assert_eq!(std::fs::read(&dest).unwrap(), b"fast path");
}
