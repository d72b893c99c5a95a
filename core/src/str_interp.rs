//! `#{var}` interpolation for compile/run/interactor command templates.
//!
//! `##` is an escaped `#`; a `#` not followed by `{` or `#` is kept as is.

use std::{collections::HashMap, ffi::OsStr, path::Path};

/// Positions are 0-based char offsets of the `#`; messages show them 1-based.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InterpError {
    #[error("Undefined variable '{0}' at {}", .1+1)]
    UndefinedVar(String, usize),

    #[error("Unclosed brace (found open brace at {})", .0+1)]
    UnclosedBrace(usize),
}

/// Variables available to a command template.
#[derive(Debug, Clone, Default)]
pub struct CommandVars {
    vars: HashMap<&'static str, String>,
}

impl CommandVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: &'static str, value: impl AsRef<OsStr>) -> Self {
        self.vars
            .insert(name, value.as_ref().to_string_lossy().into_owned());
        self
    }

    /// `fileDir`, `filePath`, `fileName`, `fileStem`, `fileExt` of the source file,
    /// and `artifactPath`.
    pub fn for_program(source: &Path, artifact: &Path) -> Self {
        let dir = source.parent().unwrap_or(Path::new("."));
        Self::new()
            .set("fileDir", dir)
            .set("filePath", source)
            .set("fileName", source.file_name().unwrap_or_default())
            .set("fileStem", source.file_stem().unwrap_or_default())
            .set("fileExt", source.extension().unwrap_or_default())
            .set("artifactPath", artifact)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn interp(&self, template: &str) -> Result<String, InterpError> {
        interp(template, self)
    }
}

pub fn interp(template: &str, vars: &CommandVars) -> Result<String, InterpError> {
    let mut res = String::with_capacity(template.len() * 2);
    let mut chars = template.chars().enumerate().peekable();

    while let Some((i, c)) = chars.next() {
        if c != '#' {
            res.push(c);
            continue;
        }
        match chars.peek() {
            Some((_, '#')) => {
                chars.next();
                res.push('#');
            }
            Some((_, '{')) => {
                chars.next();
                let mut name = String::new();
                let closed = loop {
                    match chars.next() {
                        Some((_, '}')) => break true,
                        Some((_, ch)) => name.push(ch),
                        None => break false,
                    }
                };
                if !closed {
                    return Err(InterpError::UnclosedBrace(i));
                }
                let value = vars
                    .get(&name)
                    .ok_or_else(|| InterpError::UndefinedVar(name.clone(), i))?;
                res += value;
            }
            _ => res.push('#'),
        }
    }
    Ok(res)
}

#[cfg(test)]
mod test {
    use super::*;

    fn vars() -> CommandVars {
        CommandVars::for_program(Path::new("/tmp/run/Main.cpp"), Path::new("/tmp/run/a.out"))
    }

    #[test]
    fn interp_ok() {
        let v = vars();
        assert_eq!(
            v.interp("g++ -O2 -o #{artifactPath} #{filePath}").unwrap(),
            "g++ -O2 -o /tmp/run/a.out /tmp/run/Main.cpp"
        );
        assert_eq!(v.interp("#{fileDir}").unwrap(), "/tmp/run");
        assert_eq!(v.interp("#{fileStem}.#{fileExt}").unwrap(), "Main.cpp");
        assert_eq!(v.interp("#{fileName}").unwrap(), "Main.cpp");
        assert_eq!(v.interp("echo {fileName}").unwrap(), "echo {fileName}");
        assert_eq!(v.interp("echo # {fileName}").unwrap(), "echo # {fileName}");
        assert_eq!(v.interp("echo ##{fileName}").unwrap(), "echo #{fileName}");
        assert_eq!(v.interp("#").unwrap(), "#");
        assert_eq!(v.interp("##").unwrap(), "#");
        assert_eq!(v.interp("###").unwrap(), "##");
    }

    #[test]
    fn interp_ng() {
        let v = vars();
        assert_eq!(
            v.interp("#{firstName} #{lastName}").unwrap_err(),
            InterpError::UndefinedVar("firstName".to_owned(), 0)
        );
        assert_eq!(
            v.interp("#{fileDir} #{hello").unwrap_err(),
            InterpError::UnclosedBrace(11),
        );
    }

    #[test]
    fn error_messages_use_one_based_columns() {
        let v = vars();
        assert_eq!(
            v.interp("#{nope}").unwrap_err().to_string(),
            "Undefined variable 'nope' at 1"
        );
        assert_eq!(
            v.interp("#{fileDir} #{hello").unwrap_err().to_string(),
            "Unclosed brace (found open brace at 12)"
        );
    }
}
