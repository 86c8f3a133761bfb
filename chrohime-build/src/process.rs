//! Explicit process spawning
//!
//! All external tools are invoked through [`CommandSpec`]: a program, an
//! argument list, an optional working directory and an [`EnvMap`]. The
//! parent process environment is never mutated; everything a child needs is
//! applied to that one `Command`.

use std::env;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use crate::{BuildError, Result};

/// Environment configuration for spawned commands
///
/// Holds plain variable assignments plus a list of directories to prepend
/// to the inherited `PATH`, in order.
#[derive(Debug, Clone, Default)]
pub struct EnvMap {
    vars: Vec<(OsString, OsString)>,
    path_prepend: Vec<PathBuf>,
}

impl EnvMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable for spawned commands
    pub fn set(&mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) {
        self.vars
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
    }

    /// Prepend a directory to the search path of spawned commands
    ///
    /// Directories are searched in the order they were added, before the
    /// inherited `PATH`.
    pub fn prepend_path(&mut self, dir: impl Into<PathBuf>) {
        self.path_prepend.push(dir.into());
    }

    /// Variable assignments, in insertion order
    pub fn vars(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str()))
    }

    /// The full search path: prepended directories, then the inherited PATH
    pub fn search_path(&self) -> Result<OsString> {
        let inherited = env::var_os("PATH").unwrap_or_default();
        let paths = self
            .path_prepend
            .iter()
            .cloned()
            .chain(env::split_paths(&inherited));
        env::join_paths(paths).map_err(|err| BuildError::InvalidPath(err.to_string()))
    }

    /// Apply the assignments and search path to a `Command`
    pub fn configure(&self, cmd: &mut Command) -> Result<()> {
        for (key, value) in &self.vars {
            cmd.env(key, value);
        }
        if !self.path_prepend.is_empty() {
            cmd.env("PATH", self.search_path()?);
        }
        Ok(())
    }
}

/// A fully-described subprocess invocation
#[derive(Debug, Clone)]
pub struct CommandSpec {
    program: PathBuf,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    env: EnvMap,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: EnvMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn with_env(mut self, env: &EnvMap) -> Self {
        self.env = env.clone();
        self
    }

    fn command(&self) -> Result<Command> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        self.env.configure(&mut cmd)?;
        Ok(cmd)
    }

    fn display_name(&self) -> String {
        self.program
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.to_string_lossy().into_owned())
    }

    /// Run the command to completion, failing on a non-zero exit status
    pub fn run(&self) -> Result<()> {
        let status = self.command()?.status()?;
        if !status.success() {
            return Err(BuildError::CommandFailed {
                command: self.display_name(),
                status,
            });
        }
        Ok(())
    }

    /// Run the command to completion with stdout/stderr captured
    ///
    /// The exit status is returned inside `Output` and left for the caller
    /// to interpret.
    pub fn capture(&self) -> Result<Output> {
        let output = self
            .command()?
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;
        Ok(output)
    }
}

/// Resolve an executable name against an EnvMap's search path
///
/// Lookup must use the configured path, not the parent's: on some hosts a
/// child's own PATH is not consulted when resolving the program name.
pub fn resolve_tool(name: &str, env: &EnvMap) -> Result<PathBuf> {
    let search = env.search_path()?;
    let cwd = std::env::current_dir()?;
    which::which_in(name, Some(search), cwd).map_err(|_| BuildError::ToolNotFound(name.to_string()))
}

/// Executable name with the platform suffix for depot_tools wrappers
pub fn wrapper_name(base: &str, host: crate::platform::TargetOs) -> String {
    match host {
        crate::platform::TargetOs::Win => format!("{base}.bat"),
        _ => base.to_string(),
    }
}
