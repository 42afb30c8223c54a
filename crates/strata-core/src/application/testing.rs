//! In-memory port fakes shared by the service tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::application::{
    ApplicationError,
    ports::{CommandOutput, CommandRunner, CommandSpec, Filesystem},
};
use crate::error::StrataResult;

#[derive(Default)]
pub struct FakeFs {
    pub files: Mutex<HashMap<PathBuf, String>>,
}

impl FakeFs {
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(PathBuf::from(path), content.to_string());
        self
    }

    pub fn read(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(Path::new(path)).cloned()
    }
}

impl Filesystem for FakeFs {
    fn create_dir_all(&self, _path: &Path) -> StrataResult<()> {
        Ok(())
    }

    fn write_file(&self, path: &Path, content: &str) -> StrataResult<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn read_file(&self, path: &Path) -> StrataResult<String> {
        self.files.lock().unwrap().get(path).cloned().ok_or_else(|| {
            ApplicationError::FilesystemError {
                path: path.to_path_buf(),
                reason: "not found".into(),
            }
            .into()
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }
}

/// Records every command. Fails those whose program is listed in `failing`.
#[derive(Default)]
pub struct FakeRunner {
    pub calls: Mutex<Vec<CommandSpec>>,
    pub failing: Vec<String>,
}

impl FakeRunner {
    pub fn failing(programs: &[&str]) -> Self {
        Self {
            failing: programs.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(ToString::to_string).collect()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, spec: &CommandSpec) -> StrataResult<CommandOutput> {
        self.calls.lock().unwrap().push(spec.clone());
        if self.failing.contains(&spec.program) {
            return Ok(CommandOutput {
                exit_code: Some(1),
                stdout: String::new(),
                stderr: "boom".into(),
            });
        }
        Ok(CommandOutput::success())
    }
}
