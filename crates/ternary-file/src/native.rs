//! 原生文件格式（.ternary.json）
//!
//! 带版本号的格式化 JSON 文本，便于人工查看和版本管理。
//! 保存先写临时文件再原子重命名，失败时目标文件保持原样。

use crate::document::Diagram;
use crate::error::FileError;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// 保存图表
pub fn save(diagram: &Diagram, path: &Path) -> Result<(), FileError> {
    let data = serde_json::to_vec_pretty(&diagram.to_plain()?)?;
    atomic_write(path, &data)?;

    tracing::info!(
        path = %path.display(),
        points = diagram.store().point_count(),
        lines = diagram.store().line_count(),
        "Diagram saved"
    );
    Ok(())
}

/// 加载图表
pub fn load(path: &Path) -> Result<Diagram, FileError> {
    let data = fs::read(path)?;
    let value: serde_json::Value = serde_json::from_slice(&data)?;
    let diagram = Diagram::from_plain(&value)?;

    tracing::info!(
        path = %path.display(),
        points = diagram.store().point_count(),
        lines = diagram.store().line_count(),
        "Diagram loaded"
    );
    Ok(diagram)
}

/// 目标所在目录（相对路径没有父目录时取当前目录）
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// 在目标目录下写随机命名的临时文件、落盘、重命名；
/// 失败时临时文件随 `NamedTempFile` 一起删除
fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    let result = write_synced(parent_dir(path), data).and_then(|temp| {
        temp.persist(path).map_err(|err| err.error)?;
        Ok(())
    });
    if let Err(err) = &result {
        tracing::debug!(path = %path.display(), error = %err, "Atomic write failed");
    }
    result
}

fn write_synced(dir: &Path, data: &[u8]) -> io::Result<NamedTempFile> {
    let mut temp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        writer.write_all(data)?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    Ok(temp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("phase.ternary.json");

        let mut diagram = Diagram::new();
        let p1 = diagram.add_point("P1", 0.5, 0.3, 0.2).unwrap();
        let p2 = diagram.add_point("P2", 0.2, 0.6, 0.2).unwrap();
        diagram.add_line(&p1, &p2).unwrap();

        save(&diagram, &path).unwrap();
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.list_points(), diagram.list_points());
        assert_eq!(loaded.list_lines(), diagram.list_lines());
    }

    #[test]
    fn test_overwrite_existing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("phase.json");

        let mut diagram = Diagram::new();
        save(&diagram, &path).unwrap();
        diagram.add_point("P", 1.0, 1.0, 1.0).unwrap();
        save(&diagram, &path).unwrap();

        assert_eq!(load(&path).unwrap().list_points().len(), 1);
    }

    #[test]
    fn test_existing_sibling_tmp_is_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("phase.json");
        let sibling = temp_dir.path().join("phase.json.tmp");
        fs::write(&sibling, b"user data").unwrap();

        save(&Diagram::new(), &path).unwrap();

        assert_eq!(fs::read(&sibling).unwrap(), b"user data");
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir(Path::new("a/b.json")), Path::new("a"));
        assert_eq!(parent_dir(Path::new("plain.json")), Path::new("."));
    }

    #[test]
    fn test_save_into_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("phase.json");

        let err = save(&Diagram::new(), &path).unwrap_err();
        assert!(err.is_io_error());
        assert!(!path.exists());
    }

    #[test]
    fn test_load_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.json");
        fs::write(&path, b"not json").unwrap();
        assert!(load(&path).unwrap_err().is_format_error());
    }
}
