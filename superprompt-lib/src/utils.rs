// --- FILE: superprompt-lib/src/utils.rs ---

use std::borrow::Cow;
use std::fs;
use std::io::{self, BufReader, Read};
use std::path::Path;

use log::{debug, warn};

/// Read access to the files a prompt is assembled from.
///
/// The default [`OsFiles`] goes to the real filesystem. Tests substitute
/// their own implementation to observe or fake reads.
pub trait FileSource {
    /// True if `path` exists and is a regular file (symlinks are followed).
    fn is_file(&self, path: &Path) -> bool;

    /// Reads the whole file as raw bytes.
    fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// [`FileSource`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFiles;

impl FileSource for OsFiles {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>> {
        let file = fs::File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        Ok(buffer)
    }
}

/// Reads a file as text without ever failing.
///
/// Content that is not valid UTF-8 is decoded as Latin-1 instead. If the file
/// cannot be read at all, a short `Error: ...` message is returned in place
/// of the content.
pub fn read_file_safely(path: &Path) -> String {
    read_text_with(&OsFiles, path)
}

pub(crate) fn read_text_with<F: FileSource + ?Sized>(files: &F, path: &Path) -> String {
    match files.read_bytes(path) {
        Ok(bytes) => decode_text(bytes),
        Err(e) => {
            warn!("Could not read {:?}: {}", path, e);
            format!("Error: Could not read file: {}", e)
        }
    }
}

/// Decodes bytes as UTF-8, falling back to Latin-1, and normalises line
/// endings to `\n`.
pub fn decode_text(bytes: Vec<u8>) -> String {
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            debug!(
                "Content is not valid UTF-8 ({}), decoding as Latin-1",
                e.utf8_error()
            );
            e.into_bytes().into_iter().map(char::from).collect()
        }
    };
    if text.contains('\r') {
        text.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        text
    }
}

/// The extension of `path` (text after the last `.` of the file name).
///
/// Leading dots belong to the stem, so dot-files such as `.bashrc` or
/// `..bashrc` have none. Neither do names ending in `.`.
pub(crate) fn extension_of(path: &Path) -> Option<Cow<'_, str>> {
    let name = path.file_name()?.to_string_lossy();
    let stem_start = name.len() - name.trim_start_matches('.').len();
    let dot = stem_start + name[stem_start..].rfind('.')?;
    if dot + 1 == name.len() {
        return None;
    }
    Some(match name {
        Cow::Borrowed(s) => Cow::Borrowed(&s[dot + 1..]),
        Cow::Owned(s) => Cow::Owned(s[dot + 1..].to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn reads_utf8_content_unchanged() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("note.md");
        fs::write(&path, "héllo → wörld\n")?;
        assert_eq!(read_file_safely(&path), "héllo → wörld\n");
        Ok(())
    }

    #[test]
    fn falls_back_to_latin1() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("legacy.txt");
        // "café" in Latin-1, plus a byte that never appears in UTF-8.
        fs::write(&path, [b'c', b'a', b'f', 0xE9, b' ', 0xFF])?;
        assert_eq!(read_file_safely(&path), "café ÿ");
        Ok(())
    }

    #[test]
    fn normalizes_line_endings() {
        assert_eq!(decode_text(b"a\r\nb\rc\n".to_vec()), "a\nb\nc\n");
        assert_eq!(decode_text(b"plain\n".to_vec()), "plain\n");
    }

    #[test]
    fn unreadable_file_becomes_placeholder() {
        let dir = tempdir().unwrap();
        let text = read_file_safely(&dir.path().join("missing.txt"));
        assert!(text.starts_with("Error: Could not read file: "), "{text}");
    }

    #[test]
    fn extension_rules() {
        assert_eq!(extension_of(Path::new("a/b/c.py")).as_deref(), Some("py"));
        assert_eq!(extension_of(Path::new("x.tar.gz")).as_deref(), Some("gz"));
        assert_eq!(extension_of(Path::new("Makefile")), None);
        assert_eq!(extension_of(Path::new(".bashrc")), None);
        assert_eq!(extension_of(Path::new("trailing.")), None);
        assert_eq!(extension_of(Path::new("..bashrc")), None);
        assert_eq!(extension_of(Path::new("...")), None);
        assert_eq!(extension_of(Path::new("..config.yml")).as_deref(), Some("yml"));
        assert_eq!(extension_of(Path::new("a..b")).as_deref(), Some("b"));
    }
}
