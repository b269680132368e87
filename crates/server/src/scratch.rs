use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::upload::UploadedImage;

/// Longest sanitized-name suffix kept in a scratch file name, in bytes.
const MAX_SUFFIX_BYTES: usize = 128;

/// Shared directory holding one short-lived file per in-flight request.
#[derive(Debug, Clone)]
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write the upload under a fresh, unique name.
    ///
    /// The returned guard owns the file from before the first byte is written,
    /// so a failed or partial write is cleaned up too.
    pub fn save(&self, upload: &UploadedImage) -> io::Result<ScratchFile> {
        std::fs::create_dir_all(&self.root)?;
        let file = ScratchFile { path: self.root.join(scratch_name(&upload.file_name)) };
        std::fs::write(&file.path, &upload.bytes)?;
        tracing::debug!(path = %file.path.display(), bytes = upload.bytes.len(), "Upload saved");
        Ok(file)
    }
}

/// A scratch file that is removed when dropped.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove scratch file");
            }
        }
    }
}

/// `<uuid>-<sanitized original name>`, or just the uuid when nothing safe is left.
fn scratch_name(original: &str) -> String {
    let id = Uuid::new_v4();
    let clean = sanitize_filename::sanitize(original);
    let suffix = truncate_at_char_boundary(&clean, MAX_SUFFIX_BYTES);
    if suffix.is_empty() {
        id.to_string()
    } else {
        format!("{id}-{suffix}")
    }
}

fn truncate_at_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, bytes: &'static [u8]) -> UploadedImage {
        UploadedImage { file_name: name.to_string(), bytes: bytes.into() }
    }

    #[test]
    fn scratch_name_strips_path_traversal() {
        let name = scratch_name("../../etc/passwd");
        assert!(!name.contains('/'), "name was {name}");
        assert!(name.ends_with("etcpasswd"));
    }

    #[test]
    fn scratch_name_is_unique_per_call() {
        assert_ne!(scratch_name("receipt.jpg"), scratch_name("receipt.jpg"));
    }

    #[test]
    fn scratch_name_falls_back_to_uuid() {
        let name = scratch_name("///");
        assert!(Uuid::parse_str(&name).is_ok(), "name was {name}");
    }

    #[test]
    fn truncate_respects_multibyte_chars() {
        let s = "€€€"; // 3 bytes each
        assert_eq!(truncate_at_char_boundary(s, 4), "€");
        assert_eq!(truncate_at_char_boundary(s, 9), s);
    }

    #[test]
    fn save_creates_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::new(dir.path().join("nested").join("scratch"));

        let file = scratch.save(&upload("receipt.png", b"bytes")).unwrap();

        assert!(file.path().starts_with(scratch.root()));
        assert_eq!(std::fs::read(file.path()).unwrap(), b"bytes");
    }

    #[test]
    fn drop_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::new(dir.path());

        let file = scratch.save(&upload("receipt.png", b"bytes")).unwrap();
        let path = file.path().to_path_buf();
        assert!(path.exists());
        drop(file);
        assert!(!path.exists());
    }

    #[test]
    fn drop_tolerates_already_removed_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = ScratchDir::new(dir.path()).save(&upload("a.png", b"x")).unwrap();
        std::fs::remove_file(file.path()).unwrap();
        drop(file);
    }

    #[test]
    fn same_name_uploads_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::new(dir.path());

        let a = scratch.save(&upload("receipt.png", b"first")).unwrap();
        let b = scratch.save(&upload("receipt.png", b"second")).unwrap();

        assert_ne!(a.path(), b.path());
        assert_eq!(std::fs::read(a.path()).unwrap(), b"first");
        assert_eq!(std::fs::read(b.path()).unwrap(), b"second");
    }
}
