use crate::models::SourceDocument;
use std::fs;
use std::io::{Error, ErrorKind};
use std::path::{Path, PathBuf};

pub const DOCUMENT_EXTENSIONS: [&str; 3] = ["txt", "md", "markdown"];

pub fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            DOCUMENT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

pub fn get_document_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    if dir.is_dir()
        && let Ok(entries) = fs::read_dir(dir)
    {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() && is_document(&path) {
                files.push(path);
            }
        }
    }

    files.sort();
    files
}

/// Title shown in the learning view header.
pub fn document_title(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().replace(['_', '-'], " "))
        .unwrap_or_else(|| "Untitled".to_string())
}

pub fn load_document(path: &Path) -> std::io::Result<SourceDocument> {
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Err(Error::new(
            ErrorKind::InvalidData,
            format!("{} is empty", path.display()),
        ));
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(SourceDocument { name, content })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_document() {
        assert!(is_document(Path::new("notes.md")));
        assert!(is_document(Path::new("notes.TXT")));
        assert!(is_document(Path::new("a/b/chapter.markdown")));
        assert!(!is_document(Path::new("deck.csv")));
        assert!(!is_document(Path::new("README")));
    }

    #[test]
    fn test_get_document_files_filters_and_sorts() {
        let temp_dir = tempfile::tempdir().unwrap();
        for name in ["b.md", "a.txt", "c.csv", "d.pdf"] {
            fs::write(temp_dir.path().join(name), "content").unwrap();
        }
        fs::create_dir(temp_dir.path().join("folder.md")).unwrap();

        let files = get_document_files(temp_dir.path());
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.md"]);
    }

    #[test]
    fn test_get_document_files_missing_dir() {
        assert!(get_document_files(Path::new("/definitely/not/here")).is_empty());
    }

    #[test]
    fn test_load_document() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("cell_biology.md");
        fs::write(&path, "# Cells\nThe nucleus holds DNA.\n").unwrap();

        let document = load_document(&path).unwrap();
        assert_eq!(document.name, "cell_biology.md");
        assert!(document.content.contains("nucleus"));
        assert_eq!(document_title(&path), "cell biology");
    }

    #[test]
    fn test_load_document_rejects_empty_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("empty.txt");
        fs::write(&path, "  \n").unwrap();

        let err = load_document(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }
}
