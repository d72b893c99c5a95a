use std::{
    fs::{self, ReadDir},
    path::{Path, PathBuf},
};

pub mod error {
    use std::{io, path::PathBuf};

    pub type Result<T> = std::result::Result<T, self::Error>;

    type Msg = &'static str;

    #[derive(Debug, thiserror::Error)]
    pub enum Error {
        #[error("{0} ({1}): {2}")]
        SingleIO(Msg, PathBuf, #[source] io::Error),

        #[error("Cannot access dir entry in '{0}': {1}")]
        DirEntry(PathBuf, #[source] io::Error),

        #[error("No entry matched glob '{0}' in '{1}'")]
        NoEntryMatchedGlob(::glob::Pattern, PathBuf),
    }
}
pub use error::{Error, Result};

#[must_use]
pub fn mkdir_all(path: impl AsRef<Path>) -> Result<()> {
    let dir = path.as_ref();
    fs::create_dir_all(dir).map_err(|e| Error::SingleIO("Cannot create dir", dir.to_owned(), e))
}

#[must_use]
pub fn write<P, C>(filepath: P, contents: C) -> Result<()>
where
    P: AsRef<Path>,
    C: AsRef<[u8]>,
{
    fs::write(&filepath, contents)
        .map_err(|e| Error::SingleIO("Cannot write file", filepath.as_ref().to_owned(), e))
}

#[must_use]
pub fn write_with_mkdir<P, C>(filepath: P, contents: C) -> Result<()>
where
    P: AsRef<Path>,
    C: AsRef<[u8]>,
{
    if let Some(dir) = filepath.as_ref().parent() {
        if !dir.as_os_str().is_empty() {
            self::mkdir_all(dir)?;
        }
    }
    self::write(filepath, contents)
}

#[must_use]
pub fn read(filepath: impl AsRef<Path>) -> Result<Vec<u8>> {
    fs::read(&filepath)
        .map_err(|e| Error::SingleIO("Cannot read file", filepath.as_ref().to_owned(), e))
}

#[must_use]
pub fn read_to_string(filepath: impl AsRef<Path>) -> Result<String> {
    fs::read_to_string(&filepath)
        .map_err(|e| Error::SingleIO("Cannot read file", filepath.as_ref().to_owned(), e))
}

#[must_use]
pub fn read_dir(dir: impl AsRef<Path>) -> Result<ReadDir> {
    fs::read_dir(&dir).map_err(|e| Error::SingleIO("Cannot read dir", dir.as_ref().to_owned(), e))
}

/// Lists regular files directly under `dir` whose file name matches `pattern`,
/// sorted by file name.
///
/// Fails with [`Error::NoEntryMatchedGlob`] when nothing matches.
pub fn find_files_matching(dir: impl AsRef<Path>, pattern: &::glob::Pattern) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut files = Vec::new();

    for entry in self::read_dir(dir)? {
        let entry = entry.map_err(|e| Error::DirEntry(dir.to_owned(), e))?;
        let Ok(ft) = entry.file_type() else {
            continue
        };
        if ft.is_dir() {
            continue;
        }
        if pattern.matches(entry.file_name().to_string_lossy().as_ref()) {
            files.push(entry.path());
        }
    }

    if files.is_empty() {
        return Err(Error::NoEntryMatchedGlob(pattern.to_owned(), dir.to_owned()));
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn find_files_matching_sorts_by_name() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["10.in", "02.in", "01.in", "01.out", "notes.txt"] {
            write(dir.path().join(name), "x").unwrap();
        }
        mkdir_all(dir.path().join("sub.in")).unwrap();

        let pattern = ::glob::Pattern::new("*.in").unwrap();
        let files = find_files_matching(dir.path(), &pattern).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["01.in", "02.in", "10.in"]);
    }

    #[test]
    fn find_files_matching_ng_when_nothing_matches() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = ::glob::Pattern::new("*.in").unwrap();
        let err = find_files_matching(dir.path(), &pattern).unwrap_err();
        assert!(matches!(err, Error::NoEntryMatchedGlob(..)));
    }

    #[test]
    fn write_with_mkdir_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/status.json");
        write_with_mkdir(&path, "{}").unwrap();
        assert_eq!(read_to_string(&path).unwrap(), "{}");
        assert_eq!(read(&path).unwrap(), b"{}");
    }
}
