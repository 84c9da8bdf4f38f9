use anonflux_core::envelope::{decrypt, encrypt, generate_key};
use anonflux_core::keyfile::{read_key_file, stage_key_file, write_key_file, KeyError};

#[test]
fn key_survives_the_file_handoff() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("encryption_key.key");
    let key = generate_key();
    let token = encrypt(b"artifact", &key).unwrap();

    write_key_file(&path, &key).unwrap();
    let loaded = read_key_file(&path).unwrap();

    assert_eq!(std::fs::read(&path).unwrap().len(), 32);
    assert_eq!(loaded.as_bytes(), key.as_bytes());
    assert_eq!(decrypt(&token, &loaded).unwrap(), b"artifact");
}

#[cfg(unix)]
#[test]
fn key_file_is_owner_only_even_when_it_existed_before() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("encryption_key.key");
    std::fs::write(&path, b"stale").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

    write_key_file(&path, &generate_key()).unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o600);
}

#[test]
fn wrong_length_key_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("encryption_key.key");
    std::fs::write(&path, [0u8; 44]).unwrap();

    assert!(matches!(read_key_file(&path), Err(KeyError::InvalidLength { .. })));
}

#[test]
fn missing_key_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();

    assert!(matches!(
        read_key_file(&dir.path().join("absent.key")),
        Err(KeyError::Io { .. })
    ));
}

fn entries(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[test]
fn dropped_staged_key_leaves_the_previous_key_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("encryption_key.key");
    let previous = generate_key();
    write_key_file(&path, &previous).unwrap();

    let pending = stage_key_file(&path, &generate_key()).unwrap();
    let staged = pending.staged_path().to_path_buf();
    assert_eq!(staged.parent(), Some(dir.path()));
    assert!(staged.exists());
    drop(pending);

    assert!(!staged.exists());
    assert_eq!(entries(dir.path()), 1);
    assert_eq!(read_key_file(&path).unwrap().as_bytes(), previous.as_bytes());
}

#[test]
fn committed_staged_key_replaces_the_previous_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("encryption_key.key");
    write_key_file(&path, &generate_key()).unwrap();
    let next = generate_key();

    stage_key_file(&path, &next).unwrap().commit().unwrap();

    assert_eq!(entries(dir.path()), 1);
    assert_eq!(read_key_file(&path).unwrap().as_bytes(), next.as_bytes());
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}

#[test]
fn first_commit_creates_the_key_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("encryption_key.key");
    let key = generate_key();

    stage_key_file(&path, &key).unwrap().commit().unwrap();

    assert_eq!(read_key_file(&path).unwrap().as_bytes(), key.as_bytes());
}
