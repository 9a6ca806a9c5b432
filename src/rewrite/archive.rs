//! Packaged source roots and classpath entries.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::error::RewriteError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Tar,
    TarGz,
    Zip,
}

impl ArchiveKind {
    pub fn detect(path: &Path) -> Option<ArchiveKind> {
        let name = path.file_name()?.to_string_lossy().to_ascii_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveKind::TarGz)
        } else if name.ends_with(".tar") {
            Some(ArchiveKind::Tar)
        } else if name.ends_with(".jar") || name.ends_with(".zip") {
            Some(ArchiveKind::Zip)
        } else {
            None
        }
    }
}

/// A source root ready to be read as a directory. Packaged roots are
/// unpacked into a scratch directory that is removed when this drops.
#[derive(Debug)]
pub struct SourceRoot {
    path: PathBuf,
    scratch: Option<TempDir>,
}

impl SourceRoot {
    pub fn open(path: &Path) -> Result<SourceRoot, RewriteError> {
        if path.is_dir() {
            return Ok(SourceRoot {
                path: path.to_path_buf(),
                scratch: None,
            });
        }
        let Some(kind) = ArchiveKind::detect(path) else {
            return Err(RewriteError::UnsupportedRoot(path.to_path_buf()));
        };
        let scratch = tempfile::Builder::new()
            .prefix("remap-src-")
            .tempdir()
            .map_err(|e| RewriteError::io(path, e))?;
        unpack(path, kind, scratch.path())?;
        tracing::debug!(archive = %path.display(), scratch = %scratch.path().display(), "unpacked source root");
        Ok(SourceRoot {
            path: scratch.path().to_path_buf(),
            scratch: Some(scratch),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_unpacked(&self) -> bool {
        self.scratch.is_some()
    }
}

fn archive_err(path: &Path, err: impl std::fmt::Display) -> RewriteError {
    RewriteError::Archive {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

pub fn unpack(path: &Path, kind: ArchiveKind, dest: &Path) -> Result<(), RewriteError> {
    let file = fs::File::open(path).map_err(|e| RewriteError::io(path, e))?;
    match kind {
        ArchiveKind::Tar => tar::Archive::new(file)
            .unpack(dest)
            .map_err(|e| archive_err(path, e)),
        ArchiveKind::TarGz => tar::Archive::new(flate2::read::GzDecoder::new(file))
            .unpack(dest)
            .map_err(|e| archive_err(path, e)),
        ArchiveKind::Zip => zip::ZipArchive::new(file)
            .and_then(|mut archive| archive.extract(dest))
            .map_err(|e| archive_err(path, e)),
    }
}

/// File entry names of an archive, `/` separated.
pub fn list_entries(path: &Path) -> Result<Vec<String>, RewriteError> {
    let Some(kind) = ArchiveKind::detect(path) else {
        return Err(RewriteError::UnsupportedRoot(path.to_path_buf()));
    };
    let file = fs::File::open(path).map_err(|e| RewriteError::io(path, e))?;
    match kind {
        ArchiveKind::Zip => {
            let archive = zip::ZipArchive::new(file).map_err(|e| archive_err(path, e))?;
            Ok(archive
                .file_names()
                .filter(|n| !n.ends_with('/'))
                .map(str::to_string)
                .collect())
        }
        ArchiveKind::Tar => tar_entries(tar::Archive::new(file), path),
        ArchiveKind::TarGz => {
            tar_entries(tar::Archive::new(flate2::read::GzDecoder::new(file)), path)
        }
    }
}

fn tar_entries<R: io::Read>(mut archive: tar::Archive<R>, path: &Path) -> Result<Vec<String>, RewriteError> {
    let mut names = Vec::new();
    for entry in archive.entries().map_err(|e| archive_err(path, e))? {
        let entry = entry.map_err(|e| archive_err(path, e))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let name = entry.path().map_err(|e| archive_err(path, e))?;
        names.push(name.to_string_lossy().replace('\\', "/"));
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_tar_gz(path: &Path, files: &[(&str, &[u8])]) {
        let file = fs::File::create(path).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn detects_kinds() {
        assert_eq!(ArchiveKind::detect(Path::new("a/src.tar.gz")), Some(ArchiveKind::TarGz));
        assert_eq!(ArchiveKind::detect(Path::new("a/src.TGZ")), Some(ArchiveKind::TarGz));
        assert_eq!(ArchiveKind::detect(Path::new("a/src.tar")), Some(ArchiveKind::Tar));
        assert_eq!(ArchiveKind::detect(Path::new("lib.jar")), Some(ArchiveKind::Zip));
        assert_eq!(ArchiveKind::detect(Path::new("Foo.java")), None);
    }

    #[test]
    fn tar_gz_root_is_unpacked_and_cleaned_up() {
        let dir = tempfile::TempDir::new().unwrap();
        let archive = dir.path().join("sources.tar.gz");
        write_tar_gz(&archive, &[("net/example/Foo.java", b"class Foo {}")]);

        let scratch;
        {
            let root = SourceRoot::open(&archive).unwrap();
            assert!(root.is_unpacked());
            scratch = root.path().to_path_buf();
            let text = fs::read_to_string(scratch.join("net/example/Foo.java")).unwrap();
            assert_eq!(text, "class Foo {}");
        }
        assert!(!scratch.exists());
    }

    #[test]
    fn lists_zip_entries() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("lib.jar");
        let mut zip = zip::ZipWriter::new(fs::File::create(&path).unwrap());
        let options = zip::write::SimpleFileOptions::default();
        zip.add_directory("net/", options).unwrap();
        zip.start_file("net/Entity.class", options).unwrap();
        zip.write_all(b"\xca\xfe").unwrap();
        zip.finish().unwrap();

        assert_eq!(list_entries(&path).unwrap(), ["net/Entity.class"]);
    }

    #[test]
    fn plain_files_are_not_roots() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("Foo.java");
        fs::write(&path, "class Foo {}").unwrap();
        assert!(matches!(
            SourceRoot::open(&path).unwrap_err(),
            RewriteError::UnsupportedRoot(_)
        ));
    }
}
