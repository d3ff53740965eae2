//! Tests for storage module

use super::*;
use crate::config::Credentials;
use crate::error::Error;
use bytes::Bytes;
use pretty_assertions::assert_eq;
use tempfile::tempdir;
use test_case::test_case;

// ============================================================================
// Glob Tests
// ============================================================================

#[test_case("song_data/A/B/C/*.json", "song_data/A/B/C/TRABCEI128F424C983.json", true ; "star in last segment")]
#[test_case("song_data/A/B/C/*.json", "song_data/A/B/D/TRABCEI128F424C983.json", false ; "different directory")]
#[test_case("song_data/A/B/C/*.json", "song_data/A/B/C/sub/x.json", false ; "star does not cross segments")]
#[test_case("song_data/*/*/*/*.json", "song_data/A/B/C/x.json", true ; "star per segment")]
#[test_case("log_data/**/*.json", "log_data/2018/11/2018-11-01-events.json", true ; "double star")]
#[test_case("log_data/**/*.json", "log_data/top.json", true ; "double star matches zero dirs")]
#[test_case("log_data/2018/1?/*.json", "log_data/2018/11/a.json", true ; "question mark")]
#[test_case("log_data/2018/[01]1/*.json", "log_data/2018/11/a.json", true ; "char class")]
#[test_case("log_data/2018/[!1]1/*.json", "log_data/2018/11/a.json", false ; "negated char class")]
#[test_case("data/a+b.json", "data/a+b.json", true ; "regex metacharacters are literal")]
fn test_glob_matches(pattern: &str, key: &str, expected: bool) {
    let glob = GlobPattern::new(pattern).unwrap();
    assert_eq!(glob.matches(key), expected);
}

#[test_case("song_data/A/B/C/*.json", "song_data/A/B/C" ; "fixed directories")]
#[test_case("song_data/*/*/*/*.json", "song_data" ; "wildcard directories")]
#[test_case("*.json", "" ; "root")]
#[test_case("/log_data/2018/11/*.json", "log_data/2018/11" ; "leading slash trimmed")]
fn test_glob_literal_prefix(pattern: &str, expected: &str) {
    let glob = GlobPattern::new(pattern).unwrap();
    assert_eq!(glob.literal_prefix(), expected);
}

#[test]
fn test_glob_unterminated_class() {
    assert!(GlobPattern::new("data/[ab.json").is_err());
}

// ============================================================================
// Location Parsing Tests
// ============================================================================

#[test]
fn test_parse_local_path() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().to_str().unwrap();
    let location = StorageLocation::open(path, None).unwrap();
    assert_eq!(location.scheme(), "file");
    assert!(!location.is_cloud());
}

#[test]
fn test_open_missing_local_path() {
    let temp_dir = tempdir().unwrap();
    let missing = temp_dir.path().join("missing");
    let err = StorageLocation::open(missing.to_str().unwrap(), None).unwrap_err();
    assert!(matches!(err, Error::FileNotFound { .. }));
}

#[test]
fn test_create_missing_local_path() {
    let temp_dir = tempdir().unwrap();
    let missing = temp_dir.path().join("out").join("lake");
    StorageLocation::create(missing.to_str().unwrap(), None).unwrap();
    assert!(missing.is_dir());
}

#[test]
fn test_parse_file_url() {
    let temp_dir = tempdir().unwrap();
    let url = format!("file://{}", temp_dir.path().display());
    let location = StorageLocation::open(&url, None).unwrap();
    assert_eq!(location.scheme(), "file");
}

#[test]
fn test_parse_s3a_url_with_credentials() {
    let creds = Credentials::new("AKIAEXAMPLE", "secret").with_region("us-west-2");
    let location = StorageLocation::open("s3a://udacity-dend/", Some(&creds)).unwrap();
    assert_eq!(location.scheme(), "s3");
    assert!(location.is_cloud());
    assert_eq!(location.url(), "s3://udacity-dend/");
    assert_eq!(
        location.display_path("song_data/A/B/C/x.json"),
        "s3://udacity-dend/song_data/A/B/C/x.json"
    );
}

#[test]
fn test_parse_s3_url_keeps_prefix() {
    let creds = Credentials::new("AKIAEXAMPLE", "secret").with_region("us-east-1");
    let location = StorageLocation::create("s3://bucket/lake/v1/", Some(&creds)).unwrap();
    assert_eq!(location.display_path("songs"), "s3://bucket/lake/v1/songs");
}

#[test]
fn test_parse_unsupported_scheme() {
    let err = StorageLocation::open("ftp://host/path", None).unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}

// ============================================================================
// Object I/O Tests
// ============================================================================

#[tokio::test]
async fn test_write_read_list_delete() {
    let temp_dir = tempdir().unwrap();
    let location = StorageLocation::create(temp_dir.path().to_str().unwrap(), None).unwrap();

    location
        .write("songs/year=2000/part-00000.parquet", Bytes::from_static(b"a"))
        .await
        .unwrap();
    location
        .write("songs/year=2001/part-00000.parquet", Bytes::from_static(b"b"))
        .await
        .unwrap();
    location
        .write("artists/part-00000.parquet", Bytes::from_static(b"c"))
        .await
        .unwrap();

    let data = location.read("songs/year=2001/part-00000.parquet").await.unwrap();
    assert_eq!(data.as_ref(), b"b");

    let keys = location.list("songs").await.unwrap();
    assert_eq!(
        keys,
        vec![
            "songs/year=2000/part-00000.parquet".to_string(),
            "songs/year=2001/part-00000.parquet".to_string(),
        ]
    );

    let removed = location.delete_prefix("songs").await.unwrap();
    assert_eq!(removed, 2);
    assert!(location.list("songs").await.unwrap().is_empty());
    assert_eq!(location.list("artists").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_escaped_keys_are_stored_verbatim() {
    let temp_dir = tempdir().unwrap();
    let location = StorageLocation::create(temp_dir.path().to_str().unwrap(), None).unwrap();

    let key = "songs/artist_id=AC%2FDC/part-00000.parquet";
    location.write(key, Bytes::from_static(b"x")).await.unwrap();

    assert!(temp_dir.path().join("songs").join("artist_id=AC%2FDC").is_dir());
    assert_eq!(location.list("songs").await.unwrap(), vec![key.to_string()]);
    assert_eq!(location.read(key).await.unwrap().as_ref(), b"x");

    assert_eq!(location.delete_prefix("songs").await.unwrap(), 1);
    assert!(!temp_dir
        .path()
        .join("songs/artist_id=AC%2FDC/part-00000.parquet")
        .exists());
}

#[tokio::test]
async fn test_list_glob() {
    let temp_dir = tempdir().unwrap();
    let location = StorageLocation::create(temp_dir.path().to_str().unwrap(), None).unwrap();
    for key in [
        "log_data/2018/11/b.json",
        "log_data/2018/11/a.json",
        "log_data/2018/12/c.json",
        "log_data/2018/11/notes.txt",
    ] {
        location.write(key, Bytes::from_static(b"{}")).await.unwrap();
    }

    let glob = GlobPattern::new("log_data/2018/11/*.json").unwrap();
    let keys = location.list_glob(&glob).await.unwrap();
    assert_eq!(
        keys,
        vec![
            "log_data/2018/11/a.json".to_string(),
            "log_data/2018/11/b.json".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_list_missing_prefix_is_empty() {
    let temp_dir = tempdir().unwrap();
    let location = StorageLocation::open(temp_dir.path().to_str().unwrap(), None).unwrap();
    assert!(location.list("nothing/here").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_prefix_refuses_root() {
    let temp_dir = tempdir().unwrap();
    let location = StorageLocation::create(temp_dir.path().to_str().unwrap(), None).unwrap();
    assert!(location.delete_prefix("/").await.is_err());
}
