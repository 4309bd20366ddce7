use flate2::Compression;
use flate2::write::GzEncoder;
use image_archive_retag::common::{Identity, PrefixRewrite};
use image_archive_retag::error::ArchiveError;
use image_archive_retag::image::{RegistryMigration, parse_manifest};
use image_archive_retag::{edit_archive_repositories, get_archive_tags};
use std::io::{Read, Write};
use tar::{Archive, Builder, Header};

const LAYER_NAME: &str = "5f70bf18a086007016e948b04aed3b82103a36bea41755b6cddfaf10ace3c6ef/layer.tar";

fn build_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = Builder::new(Vec::new());
    for (name, body) in entries {
        let mut header = Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(1_650_000_000);
        builder.append_data(&mut header, name, *body).unwrap();
    }
    builder.into_inner().unwrap()
}

fn read_entries(data: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = Archive::new(data);
    archive
        .entries()
        .unwrap()
        .map(|entry| {
            let mut entry = entry.unwrap();
            let name = entry.path().unwrap().to_string_lossy().to_string();
            let mut body = Vec::new();
            entry.read_to_end(&mut body).unwrap();
            (name, body)
        })
        .collect()
}

fn sample_archive() -> Vec<u8> {
    let repositories: &[u8] = br#"{"old.io/foo":{"v1":"5f70bf18"}}"#;
    let manifest: &[u8] = br#"[{"Config":"5f70bf18.json","RepoTags":["old.io/foo:v1"],"Layers":["5f70bf18a086007016e948b04aed3b82103a36bea41755b6cddfaf10ace3c6ef/layer.tar"]}]"#;
    let config: &[u8] = br#"{"architecture":"amd64"}"#;
    let layer: &[u8] = &[7u8; 2000];
    build_archive(&[
        ("A", b"first".as_slice()),
        ("repositories", repositories),
        ("5f70bf18.json", config),
        ("manifest.json", manifest),
        (LAYER_NAME, layer),
    ])
}

#[test]
fn test_list_tags_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&sample_archive()).unwrap();
    file.flush().unwrap();

    let tags = get_archive_tags(file.path()).unwrap();
    assert_eq!(tags, vec!["old.io/foo:v1"]);
}

#[test]
fn test_list_tags_from_gzipped_file() {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&sample_archive()).unwrap();
    let compressed = encoder.finish().unwrap();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&compressed).unwrap();
    file.flush().unwrap();

    assert_eq!(get_archive_tags(file.path()).unwrap(), vec!["old.io/foo:v1"]);
}

#[test]
fn test_list_tags_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = get_archive_tags(dir.path().join("missing.tar")).unwrap_err();
    assert!(matches!(err, ArchiveError::Io(_)));
}

#[test]
fn test_list_tags_without_repositories_entry() {
    let archive = build_archive(&[("manifest.json", b"[]".as_slice()), ("x", b"y".as_slice())]);
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&archive).unwrap();
    file.flush().unwrap();

    assert!(matches!(
        get_archive_tags(file.path()),
        Err(ArchiveError::NotFound(_))
    ));
}

#[test]
fn test_rewrite_only_touches_metadata() {
    let input = sample_archive();
    let mut output = Vec::new();
    let stats = edit_archive_repositories(
        input.as_slice(),
        &mut output,
        &PrefixRewrite::new("old.io", "new.io"),
        RegistryMigration::disabled(),
    )
    .unwrap();
    assert_eq!(stats.entries, 5);
    assert_eq!(stats.edited, 2);

    let before = read_entries(&input);
    let after = read_entries(&output);
    let names: Vec<_> = after.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(
        names,
        vec!["A", "repositories", "5f70bf18.json", "manifest.json", LAYER_NAME]
    );

    assert_eq!(after[0], before[0]);
    assert_eq!(after[2], before[2]);
    assert_eq!(after[4], before[4]);
    assert_eq!(after[1].1, br#"{"new.io/foo":{"v1":"5f70bf18"}}"#);

    let manifest = parse_manifest(&after[3].1).unwrap();
    assert_eq!(manifest[0].repo_tags, vec!["new.io/foo:v1"]);
    assert_eq!(manifest[0].config, "5f70bf18.json");
    assert_eq!(manifest[0].layers, vec![LAYER_NAME]);
}

#[test]
fn test_identity_rewrite_reproduces_archive() {
    // LAYER_NAME is longer than 100 bytes, so the input carries a GNU long-name record
    let input = sample_archive();
    let mut output = Vec::new();
    edit_archive_repositories(
        input.as_slice(),
        &mut output,
        &Identity,
        RegistryMigration::disabled(),
    )
    .unwrap();
    assert_eq!(output, input);
}

#[test]
fn test_archive_without_metadata_is_copied() {
    let input = build_archive(&[("only", b"content".as_slice())]);
    let mut output = Vec::new();
    let stats = edit_archive_repositories(
        input.as_slice(),
        &mut output,
        &|_: &str| "never/called".to_string(),
        RegistryMigration::disabled(),
    )
    .unwrap();
    assert_eq!(stats.edited, 0);
    assert_eq!(output, input);
}

#[test]
fn test_invalid_repo_tag_aborts_without_finalizing() {
    let input = build_archive(&[
        ("A", b"first".as_slice()),
        (
            "manifest.json",
            br#"[{"Config":"c.json","RepoTags":["repo:tag:extra"],"Layers":[]}]"#.as_slice(),
        ),
    ]);
    let mut output = Vec::new();
    let err = edit_archive_repositories(
        input.as_slice(),
        &mut output,
        &Identity,
        RegistryMigration::disabled(),
    )
    .unwrap_err();
    assert!(matches!(err, ArchiveError::InvalidRepoTag(_)));
    // header and body of "A" only, no end-of-archive marker
    assert_eq!(output.len(), 1024);
}

#[test]
fn test_migration_depends_on_kubeadm_version() {
    let input = build_archive(&[
        (
            "repositories",
            br#"{"k8s.gcr.io/pause":{"3.6":"sha256:1"}}"#.as_slice(),
        ),
        (
            "manifest.json",
            br#"[{"Config":"c.json","RepoTags":["k8s.gcr.io/pause:3.6"],"Layers":[]}]"#.as_slice(),
        ),
    ]);

    let rewrite = |version: &str| {
        let mut output = Vec::new();
        edit_archive_repositories(
            input.as_slice(),
            &mut output,
            &Identity,
            RegistryMigration::new(Some(version)).unwrap(),
        )
        .unwrap();
        let entries = read_entries(&output);
        parse_manifest(&entries[1].1).unwrap()[0].repo_tags.clone()
    };

    assert_eq!(rewrite("1.23.0"), vec!["registry.k8s.io/pause:3.6"]);
    assert_eq!(rewrite("1.21.0"), vec!["k8s.gcr.io/pause:3.6"]);
}

#[test]
fn test_truncated_input_fails() {
    let input = sample_archive();
    let truncated = &input[..input.len() / 2];
    let mut output = Vec::new();
    assert!(
        edit_archive_repositories(
            truncated,
            &mut output,
            &Identity,
            RegistryMigration::disabled()
        )
        .is_err()
    );
}

#[test]
fn test_rewrite_accepts_layerless_image() {
    let input = build_archive(&[
        ("repositories", br#"{"old.io/scratch":{"v1":"sha256:1"}}"#.as_slice()),
        (
            "manifest.json",
            br#"[{"Config":"c.json","RepoTags":["old.io/scratch:v1"],"Layers":null}]"#.as_slice(),
        ),
    ]);
    let mut output = Vec::new();
    let stats = edit_archive_repositories(
        input.as_slice(),
        &mut output,
        &PrefixRewrite::new("old.io", "new.io"),
        RegistryMigration::disabled(),
    )
    .unwrap();
    assert_eq!(stats.edited, 2);

    let entries = read_entries(&output);
    assert_eq!(
        entries[1].1,
        br#"[{"Config":"c.json","RepoTags":["new.io/scratch:v1"],"Layers":[]}]"#
    );
}
