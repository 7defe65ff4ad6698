//! Timeout-guarded execution of external dump producers.

use std::io::{self, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use sdt_lang_api::{CommandSpec, LangError, LangResult, TreeSource};
use wait_timeout::ChildExt;

/// Timeout applied when the configuration does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Dump producer running `executable switches… <file>` and capturing stdout.
#[derive(Debug, Clone)]
pub struct CommandSource {
    spec: CommandSpec,
    timeout: Duration,
}

impl CommandSource {
    /// Construct a source for the given command with the default timeout.
    #[must_use]
    pub const fn new(spec: CommandSpec) -> Self {
        Self {
            spec,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Replace the per-invocation timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The command this source runs.
    #[must_use]
    pub const fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    pub(crate) fn run(&self, path: &Path) -> LangResult<ProcessOutput> {
        let program = self.spec.executable.clone();
        let mut command = Command::new(&program);
        command.args(self.spec.expanded_switches());
        command.arg(path);
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                LangError::ToolNotFound {
                    program: program.clone(),
                }
            } else {
                LangError::message(format!("failed to spawn {program}: {err}"))
            }
        })?;

        let stdout_handle = child.stdout.take().map(|mut stdout| {
            thread::spawn(move || -> io::Result<Vec<u8>> {
                let mut buffer = Vec::new();
                stdout.read_to_end(&mut buffer)?;
                Ok(buffer)
            })
        });

        let stderr_handle = child.stderr.take().map(|mut stderr| {
            thread::spawn(move || -> io::Result<Vec<u8>> {
                let mut buffer = Vec::new();
                stderr.read_to_end(&mut buffer)?;
                Ok(buffer)
            })
        });

        match child.wait_timeout(self.timeout) {
            Ok(Some(_)) => (),
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(LangError::ToolTimedOut {
                    program,
                    seconds: self.timeout.as_secs(),
                });
            }
            Err(err) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(LangError::message(format!(
                    "failed waiting on {program}: {err}"
                )));
            }
        }

        let status = child
            .wait()
            .map_err(|err| LangError::message(format!("failed to reap {program}: {err}")))?;

        let stdout = join_reader(stdout_handle, &program, "stdout")?;
        let stderr = join_reader(stderr_handle, &program, "stderr")?;

        if !status.success() {
            let code = status
                .code()
                .map_or_else(|| "terminated".to_string(), |c| c.to_string());
            return Err(LangError::ToolFailed {
                program,
                status: code,
                stderr: String::from_utf8_lossy(&stderr).trim().to_owned(),
            });
        }

        tracing::debug!(
            program = %program,
            file = %path.display(),
            bytes = stdout.len(),
            "dump produced"
        );
        Ok(ProcessOutput { stdout, stderr })
    }
}

impl TreeSource for CommandSource {
    fn describe(&self) -> String {
        self.spec.display()
    }

    fn dump(&self, path: &Path) -> LangResult<Vec<u8>> {
        let output = self.run(path)?;
        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            return Err(LangError::EmptyOutput {
                program: self.spec.executable.clone(),
                stderr: output.stderr_text(),
            });
        }
        Ok(output.stdout)
    }
}

fn join_reader(
    handle: Option<thread::JoinHandle<io::Result<Vec<u8>>>>,
    program: &str,
    stream: &str,
) -> LangResult<Vec<u8>> {
    match handle {
        Some(handle) => handle
            .join()
            .map_err(|_| LangError::message(format!("failed to join {program} {stream} reader")))?
            .map_err(|err| LangError::message(format!("failed to read {program} {stream}: {err}"))),
        None => Ok(Vec::new()),
    }
}

#[derive(Debug)]
pub(crate) struct ProcessOutput {
    pub(crate) stdout: Vec<u8>,
    pub(crate) stderr: Vec<u8>,
}

impl ProcessOutput {
    pub(crate) fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_owned()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn source(executable: &str, switches: &[&str]) -> CommandSource {
        CommandSource::new(CommandSpec::new(executable, switches.iter().copied()))
    }

    #[test]
    fn captures_stdout_of_successful_command() {
        let temp = TempDir::new().expect("tempdir");
        let file = temp.path().join("input.txt");
        std::fs::write(&file, "tree\n").expect("write input");

        let dump = source("cat", &[]).dump(&file).expect("dump");
        assert_eq!(dump, b"tree\n");
    }

    #[test]
    fn options_are_substituted_into_switches() {
        let temp = TempDir::new().expect("tempdir");
        let file = temp.path().join("input.txt");
        std::fs::write(&file, "").expect("write input");

        let spec = CommandSpec::new("sh", ["-c", "echo ${OPTIONS} \"$0\""]).with_options("opts");
        let dump = CommandSource::new(spec).dump(&file).expect("dump");
        let text = String::from_utf8(dump).expect("utf8");
        assert!(text.starts_with("opts "));
        assert!(text.trim_end().ends_with("input.txt"));
    }

    #[test]
    fn missing_program_is_reported_as_not_found() {
        let err = source("sdt-no-such-parser", &[])
            .dump(Path::new("x.rb"))
            .expect_err("should fail");
        assert!(matches!(err, LangError::ToolNotFound { .. }));
        assert!(err.is_unavailable());
    }

    #[test]
    fn non_zero_exit_carries_status_and_stderr() {
        let err = source("sh", &["-c", "echo broken >&2; exit 3"])
            .dump(Path::new("x.rb"))
            .expect_err("should fail");
        match err {
            LangError::ToolFailed { status, stderr, .. } => {
                assert_eq!(status, "3");
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_stdout_is_an_error() {
        let err = source("sh", &["-c", "true"])
            .dump(Path::new("x.rb"))
            .expect_err("should fail");
        assert!(matches!(err, LangError::EmptyOutput { ref stderr, .. } if stderr.is_empty()));
    }

    #[test]
    fn empty_stdout_keeps_stderr_diagnostics() {
        let err = source("sh", &["-c", "echo 'no parser for input' >&2"])
            .dump(Path::new("x.rb"))
            .expect_err("should fail");
        match err {
            LangError::EmptyOutput { stderr, .. } => assert_eq!(stderr, "no parser for input"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn hung_command_is_killed_after_timeout() {
        let err = source("sh", &["-c", "sleep 5"])
            .with_timeout(Duration::from_millis(200))
            .dump(Path::new("x.rb"))
            .expect_err("should time out");
        assert!(matches!(err, LangError::ToolTimedOut { .. }));
    }
}
