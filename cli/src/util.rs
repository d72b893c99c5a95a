use std::{
    path::{Path, PathBuf},
    process::exit,
};

pub fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|e| {
        eprintln!("Failed to get current dir: {}", e);
        exit(1);
    })
}

pub fn replace_homedir_to_tilde(path: impl Into<PathBuf>) -> PathBuf {
    let path = path.into();
    let Some(home_dir) = ::dirs::home_dir() else {
        return path
    };
    path.strip_prefix(home_dir)
        .map(|path| Path::new("~").join(path))
        .unwrap_or(path)
}

/// File name of `path` as UTF-8, for matching against language patterns.
pub fn filename_of(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn filename_of_strips_dirs() {
        assert_eq!(filename_of(Path::new("src/main.cpp")), "main.cpp");
        assert_eq!(filename_of(Path::new("/")), "");
    }

    #[test]
    fn homedir_becomes_tilde() {
        let Some(home) = dirs::home_dir() else {
            return
        };
        assert_eq!(
            replace_homedir_to_tilde(home.join("a/saiten.toml")),
            Path::new("~/a/saiten.toml")
        );
        assert_eq!(replace_homedir_to_tilde("/x/y"), Path::new("/x/y"));
    }
}
