use crate::sandbox::Language;

/// A language described by shell command templates (see [`crate::str_interp`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLanguage {
    name: String,
    source_filename: String,
    artifact_filename: String,
    compile: Option<String>,
    run: String,
}

impl CommandLanguage {
    pub fn interpreted(
        name: impl Into<String>,
        source_filename: impl Into<String>,
        run: impl Into<String>,
    ) -> Self {
        let source_filename = source_filename.into();
        Self {
            name: name.into(),
            artifact_filename: source_filename.clone(),
            source_filename,
            compile: None,
            run: run.into(),
        }
    }

    pub fn compiled(
        name: impl Into<String>,
        source_filename: impl Into<String>,
        artifact_filename: impl Into<String>,
        compile: impl Into<String>,
        run: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source_filename: source_filename.into(),
            artifact_filename: artifact_filename.into(),
            compile: Some(compile.into()),
            run: run.into(),
        }
    }
}

impl Language for CommandLanguage {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_filename(&self) -> &str {
        &self.source_filename
    }

    fn artifact_filename(&self) -> &str {
        &self.artifact_filename
    }

    fn compile_command(&self) -> Option<&str> {
        self.compile.as_deref()
    }

    fn run_command(&self) -> &str {
        &self.run
    }
}
