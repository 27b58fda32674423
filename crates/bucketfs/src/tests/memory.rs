use crate::error::Error;
use crate::metadata::{FileMode, umask};
use crate::EntryType;
use super::super::memory::new_fs;

#[tokio::test]
async fn test_create_then_write_then_open() {
    let fs = new_fs().await;

    let file = fs.create("testfile").await.unwrap();
    assert_eq!(file.stat().size(), 0);
    assert_eq!(file.stat().mode(), FileMode::new(0o666));
    file.close();

    fs.write_file("testfile", "hello world", FileMode::new(0o644))
        .await
        .unwrap();

    let file = fs.open("testfile").await.unwrap();
    let info = file.stat();
    assert_eq!(info.size(), 11);
    assert_eq!(info.name(), "testfile");
    assert_eq!(info.mode(), FileMode::new(0o644));
    assert!(!info.is_dir());
    file.close();
}

#[tokio::test]
async fn test_write_then_read_roundtrip() {
    let fs = new_fs().await;
    let data = b"\x00\x01binary\xff".to_vec();
    fs.write_file("dir/blob.bin", data.clone(), FileMode::new(0o600))
        .await
        .unwrap();

    assert_eq!(fs.read_file("dir/blob.bin").await.unwrap(), data);
    let info = fs.stat("dir/blob.bin").await.unwrap();
    assert_eq!(info.mode().perm(), umask(0, FileMode::new(0o600)).perm());
    assert_eq!(info.entry_type(), EntryType::File);
}

#[tokio::test]
async fn test_write_from_reader() {
    let fs = new_fs().await;
    let mut reader: &[u8] = b"streamed from a reader";
    let n = fs
        .write_from("up/load.txt", &mut reader, FileMode::new(0o640))
        .await
        .unwrap();
    assert_eq!(n, 22);
    assert_eq!(
        fs.read_file("up/load.txt").await.unwrap(),
        b"streamed from a reader"
    );
    assert!(fs.stat("up").await.unwrap().is_dir());
}

#[tokio::test]
async fn test_write_from_failing_reader_leaves_nothing() {
    let fs = new_fs().await;
    let mut reader = tokio_test::io::Builder::new()
        .read(b"partial")
        .read_error(std::io::Error::other("connection reset"))
        .build();
    let err = fs
        .write_from("broken", &mut reader, FileMode::new(0o644))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
    assert!(fs.stat("broken").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_mkdir_all_creates_each_level() {
    let fs = new_fs().await;
    fs.mkdir_all("a/b/c", FileMode::new(0o755)).await.unwrap();

    for path in ["a", "a/b", "a/b/c", "/", ""] {
        let info = fs.stat(path).await.unwrap();
        assert!(info.is_dir(), "{path} should be a directory");
        assert_eq!(info.mode().perm(), 0o755);
    }

    // Resuming an interrupted run is a no-op.
    fs.mkdir_all("a/b/c", FileMode::new(0o755)).await.unwrap();
}

#[tokio::test]
async fn test_remove_empty_directory() {
    let fs = new_fs().await;
    fs.mkdir_all("empty", FileMode::new(0o755)).await.unwrap();
    fs.remove("empty").await.unwrap();
    assert!(fs.stat("empty").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_remove_non_empty_directory() {
    let fs = new_fs().await;
    fs.write_file("full/f", "x", FileMode::new(0o644))
        .await
        .unwrap();
    fs.mkdir_all("nested/child", FileMode::new(0o755))
        .await
        .unwrap();

    assert!(matches!(fs.remove("full").await, Err(Error::NotEmpty(p)) if p == "full"));
    assert!(fs.stat("full").await.unwrap().is_dir());

    assert!(matches!(fs.remove("nested").await, Err(Error::NotEmpty(_))));
    assert!(matches!(fs.remove("/").await, Err(Error::NotEmpty(_))));
}

#[tokio::test]
async fn test_remove_file() {
    let fs = new_fs().await;
    fs.write_file("d/f", "x", FileMode::new(0o644)).await.unwrap();
    fs.remove("d/f").await.unwrap();
    assert!(fs.stat("d/f").await.unwrap_err().is_not_found());
    fs.remove("d").await.unwrap();
}

#[tokio::test]
async fn test_read_dir_lists_exactly_the_children() {
    let fs = new_fs().await;
    fs.write_file("dir/f1", "1", FileMode::new(0o644))
        .await
        .unwrap();
    fs.write_file("dir/f2", "22", FileMode::new(0o600))
        .await
        .unwrap();

    let entries = fs.read_dir("dir").await.unwrap();
    let names: Vec<_> = entries.iter().map(|e| e.name()).collect();
    assert_eq!(names, vec!["f1", "f2"]);
    assert_eq!(entries[1].info().size(), 2);
    assert_eq!(entries[1].mode(), FileMode::new(0o600));
}

#[tokio::test]
async fn test_read_dir_reports_subdirectories() {
    let fs = new_fs().await;
    fs.write_file("top/sub/deep.txt", "abc", FileMode::new(0o644))
        .await
        .unwrap();
    fs.write_file("top/file", "x", FileMode::new(0o644))
        .await
        .unwrap();

    let entries = fs.read_dir("top").await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name(), "file");
    assert!(!entries[0].is_dir());
    assert_eq!(entries[1].name(), "sub");
    assert!(entries[1].is_dir());
    assert_eq!(entries[1].info().size(), 3);

    let root = fs.read_dir("/").await.unwrap();
    assert_eq!(root.len(), 1);
    assert_eq!(root[0].name(), "top");
}

#[tokio::test]
async fn test_directory_totals() {
    let fs = new_fs().await;
    fs.write_file("t/a", vec![0u8; 10], FileMode::new(0o644))
        .await
        .unwrap();
    fs.write_file("t/b/c", vec![0u8; 5], FileMode::new(0o644))
        .await
        .unwrap();

    let dir = fs.stat("t").await.unwrap();
    let newest = fs.stat("t/b/c").await.unwrap().modified();
    assert_eq!(dir.size(), 15);
    assert!(dir.modified() >= newest);
}

#[tokio::test]
async fn test_remove_all_recursive() {
    let fs = new_fs().await;
    fs.mkdir_all("a/b/c", FileMode::new(0o755)).await.unwrap();
    fs.write_file("a/file", "x", FileMode::new(0o644))
        .await
        .unwrap();
    fs.write_file("other", "keep", FileMode::new(0o644))
        .await
        .unwrap();

    fs.remove_all("a").await.unwrap();

    for path in ["a", "a/b", "a/b/c", "a/file"] {
        assert!(fs.stat(path).await.unwrap_err().is_not_found(), "{path}");
    }
    assert_eq!(fs.read_file("other").await.unwrap(), b"keep");
}

#[tokio::test]
async fn test_remove_all_many_objects() {
    let fs = new_fs().await;
    for i in 0..(crate::REMOVE_ALL_CHANNEL_DEPTH * 3) {
        fs.write_file(&format!("bulk/{}/{i}", i % 7), "x", FileMode::new(0o644))
            .await
            .unwrap();
    }
    fs.remove_all("bulk").await.unwrap();
    assert!(fs.read_dir("/").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_open_missing() {
    let fs = new_fs().await;
    let err = fs.open("missing/path").await.unwrap_err();
    assert!(matches!(&err, Error::NotFound(p) if p == "missing/path"));
}

#[tokio::test]
async fn test_read_file_on_directory() {
    let fs = new_fs().await;
    fs.mkdir_all("d", FileMode::new(0o755)).await.unwrap();
    assert!(matches!(fs.read_file("d").await, Err(Error::IsADirectory(_))));
}

#[tokio::test]
async fn test_writes_to_root_are_rejected() {
    let fs = new_fs().await;
    assert!(matches!(fs.create("/").await, Err(Error::IsADirectory(_))));
    assert!(matches!(
        fs.write_file(".", "x", FileMode::new(0o644)).await,
        Err(Error::IsADirectory(_))
    ));
}

#[tokio::test]
async fn test_escaping_paths_are_invalid() {
    let fs = new_fs().await;
    assert!(matches!(fs.stat("../etc/passwd").await, Err(Error::InvalidPath(_))));
    assert!(matches!(
        fs.mkdir("a/../../b", FileMode::new(0o755)).await,
        Err(Error::InvalidPath(_))
    ));
}

#[tokio::test]
async fn test_chmod_file_and_directory() {
    let fs = new_fs().await;
    fs.write_file("doc.md", "# title", FileMode::new(0o644))
        .await
        .unwrap();
    fs.chmod("doc.md", FileMode::new(0o600)).await.unwrap();

    let info = fs.stat("doc.md").await.unwrap();
    assert_eq!(info.mode(), FileMode::new(0o600));
    assert_eq!(info.content_type(), Some("text/markdown; charset=utf-8"));
    assert_eq!(fs.read_file("doc.md").await.unwrap(), b"# title");

    fs.mkdir_all("d", FileMode::new(0o755)).await.unwrap();
    fs.chmod("d", FileMode::new(0o700)).await.unwrap();
    let info = fs.stat("d").await.unwrap();
    assert!(info.mode().is_dir());
    assert_eq!(info.mode().perm(), 0o700);

    assert!(fs.chmod("nope", FileMode::new(0o600)).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_rename_moves_content_and_mode() {
    let fs = new_fs().await;
    fs.write_file("from/a.json", "{}", FileMode::new(0o640))
        .await
        .unwrap();
    fs.rename("from/a.json", "to/b.json").await.unwrap();

    assert!(fs.stat("from/a.json").await.unwrap_err().is_not_found());
    assert!(fs.stat("from").await.unwrap().is_dir());
    let info = fs.stat("to/b.json").await.unwrap();
    assert_eq!(info.mode(), FileMode::new(0o640));
    assert_eq!(info.content_type(), Some("application/json"));
    assert_eq!(fs.read_file("to/b.json").await.unwrap(), b"{}");
}

#[tokio::test]
async fn test_rename_refuses_directories() {
    let fs = new_fs().await;
    fs.mkdir_all("d", FileMode::new(0o755)).await.unwrap();
    fs.write_file("f", "x", FileMode::new(0o644)).await.unwrap();

    assert!(matches!(fs.rename("d", "e").await, Err(Error::IsADirectory(p)) if p == "d"));
    assert!(matches!(fs.rename("f", "d").await, Err(Error::IsADirectory(p)) if p == "d"));
    assert_eq!(fs.read_file("f").await.unwrap(), b"x");
}
