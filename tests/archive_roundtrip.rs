//! Archive creation: member-name mapping, dedup, atomic staging of the
//! archive file itself, and roundtrips through the extractor.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use stagecraft::{create, extract, list, CreateOptions, Error, ExtractOptions, Format, TarCodec};

/// Lay out `root/a/{1.txt,2.txt,sub/3.txt}` and return `root`.
fn sample_tree(base: &Path) -> PathBuf {
    let root = base.join("srcroot");
    std::fs::create_dir_all(root.join("a/sub")).unwrap();
    std::fs::write(root.join("a/1.txt"), b"one").unwrap();
    std::fs::write(root.join("a/2.txt"), b"two").unwrap();
    std::fs::write(root.join("a/sub/3.txt"), b"three").unwrap();
    root
}

fn names(listing: &[PathBuf]) -> HashSet<PathBuf> {
    listing.iter().cloned().collect()
}

#[test]
fn tar_gz_roundtrip_preserves_tree_and_contents() {
    let td = tempfile::tempdir().unwrap();
    let root = sample_tree(td.path());
    let archive = td.path().join("out.tar.gz");

    create(&archive, &[root.join("a")], &CreateOptions::default()).unwrap();

    // Without an explicit root, names keep the shared top directory.
    let listing = names(&list(&archive, None).unwrap());
    let expected: HashSet<PathBuf> =
        ["a", "a/1.txt", "a/2.txt", "a/sub", "a/sub/3.txt"].iter().map(PathBuf::from).collect();
    assert_eq!(listing, expected);

    let dest = td.path().join("dest");
    extract(&archive, &dest, &ExtractOptions::default()).unwrap();
    assert_eq!(std::fs::read(dest.join("a/1.txt")).unwrap(), b"one");
    assert_eq!(std::fs::read(dest.join("a/sub/3.txt")).unwrap(), b"three");
}

#[test]
fn zip_roundtrip_preserves_contents() {
    let td = tempfile::tempdir().unwrap();
    let root = sample_tree(td.path());
    let archive = td.path().join("out.zip");

    create(&archive, &[root.join("a")], &CreateOptions::default()).unwrap();
    let dest = td.path().join("dest");
    extract(&archive, &dest, &ExtractOptions::default()).unwrap();

    assert_eq!(std::fs::read(dest.join("a/2.txt")).unwrap(), b"two");
}

#[test]
fn root_option_strips_the_prefix_from_stored_names() {
    let td = tempfile::tempdir().unwrap();
    let root = sample_tree(td.path());
    let archive = td.path().join("out.tar");

    let options = CreateOptions::default().root(&root);
    create(&archive, &[root.join("a/sub/3.txt")], &options).unwrap();

    assert_eq!(list(&archive, None).unwrap(), vec![PathBuf::from("a/sub/3.txt")]);
}

#[test]
fn repath_renames_a_stored_prefix() {
    let td = tempfile::tempdir().unwrap();
    let root = sample_tree(td.path());
    let archive = td.path().join("out.tar");

    let options = CreateOptions::default()
        .root(&root)
        .repath(root.join("a/sub"), "renamed");
    create(&archive, &[root.join("a/sub/3.txt")], &options).unwrap();

    assert_eq!(list(&archive, None).unwrap(), vec![PathBuf::from("renamed/3.txt")]);
}

#[test]
fn repath_matches_root_relative_keys() {
    let td = tempfile::tempdir().unwrap();
    let root = sample_tree(td.path());
    let archive = td.path().join("out.tar");

    // The key names the root-stripped prefix, not the on-disk path.
    let options = CreateOptions::default().root(&root).repath("a/sub", "renamed");
    create(&archive, &[root.join("a/sub/3.txt")], &options).unwrap();

    assert_eq!(list(&archive, None).unwrap(), vec![PathBuf::from("renamed/3.txt")]);
}

#[test]
fn repath_applies_to_walked_directory_members() {
    let td = tempfile::tempdir().unwrap();
    let root = sample_tree(td.path());
    let archive = td.path().join("out.tgz");

    let options = CreateOptions::default()
        .root(&root)
        .repath(root.join("a"), "top");
    create(&archive, &[root.join("a")], &options).unwrap();

    let listing = names(&list(&archive, None).unwrap());
    let expected: HashSet<PathBuf> =
        ["top", "top/1.txt", "top/2.txt", "top/sub", "top/sub/3.txt"]
            .iter()
            .map(PathBuf::from)
            .collect();
    assert_eq!(listing, expected);
}

#[test]
fn duplicate_inputs_are_stored_once() {
    let td = tempfile::tempdir().unwrap();
    let root = sample_tree(td.path());
    let archive = td.path().join("out.tar");

    let input = root.join("a/1.txt");
    create(&archive, &[input.clone(), input], &CreateOptions::default()).unwrap();

    assert_eq!(list(&archive, None).unwrap().len(), 1);
}

#[test]
fn input_outside_root_falls_back_to_common_stripping() {
    let td = tempfile::tempdir().unwrap();
    let root = sample_tree(td.path());
    let elsewhere = td.path().join("elsewhere.txt");
    std::fs::write(&elsewhere, b"x").unwrap();

    // The input is nowhere near the given root, so its stored name comes
    // from common-directory stripping instead of being absolute.
    let options = CreateOptions::default().root(root.join("a"));
    create(&td.path().join("out.tar"), &[elsewhere], &options).unwrap();

    assert_eq!(
        list(&td.path().join("out.tar"), None).unwrap(),
        vec![PathBuf::from("elsewhere.txt")]
    );
}

#[test]
fn empty_input_list_is_an_archive_error() {
    let td = tempfile::tempdir().unwrap();
    let err = create(&td.path().join("out.tar"), &[], &CreateOptions::default()).unwrap_err();
    assert!(matches!(err, Error::Archive { .. }), "got {err}");
}

#[test]
fn failed_creation_leaves_no_archive_behind() {
    let td = tempfile::tempdir().unwrap();
    let archive = td.path().join("out.tar");

    let missing = td.path().join("does-not-exist");
    assert!(create(&archive, &[missing], &CreateOptions::default()).is_err());

    assert!(!archive.exists(), "failed creation is invisible at the destination");
    let residue: Vec<_> = std::fs::read_dir(td.path()).unwrap().collect();
    assert!(residue.is_empty(), "no staging residue: {residue:?}");
}

#[test]
fn creation_replaces_an_existing_archive_atomically() {
    let td = tempfile::tempdir().unwrap();
    let root = sample_tree(td.path());
    let archive = td.path().join("out.tar");
    std::fs::write(&archive, b"previous archive").unwrap();

    create(&archive, &[root.join("a/1.txt")], &CreateOptions::default()).unwrap();
    assert_eq!(list(&archive, None).unwrap().len(), 1);
}

#[test]
fn unknown_destination_extension_is_not_supported() {
    let td = tempfile::tempdir().unwrap();
    let root = sample_tree(td.path());

    let err = create(
        &td.path().join("out.weird"),
        &[root.join("a/1.txt")],
        &CreateOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::NotSupported { .. }), "got {err}");
}

#[test]
fn format_override_allows_extensionless_destinations() {
    let td = tempfile::tempdir().unwrap();
    let root = sample_tree(td.path());
    let archive = td.path().join("bundle");

    let options = CreateOptions::default().format(Format::Tar(TarCodec::Bzip2));
    create(&archive, &[root.join("a/1.txt")], &options).unwrap();

    let listing = list(&archive, Some(Format::Tar(TarCodec::Bzip2))).unwrap();
    assert_eq!(listing.len(), 1);
}

#[test]
fn xz_codec_roundtrips() {
    let td = tempfile::tempdir().unwrap();
    let root = sample_tree(td.path());
    let archive = td.path().join("out.tar.xz");

    create(&archive, &[root.join("a")], &CreateOptions::default()).unwrap();
    let dest = td.path().join("dest");
    extract(&archive, &dest, &ExtractOptions::default()).unwrap();
    assert_eq!(std::fs::read(dest.join("a/sub/3.txt")).unwrap(), b"three");
}
