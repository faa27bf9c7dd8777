//! Process execution with streamed output.

use super::args::CommandLine;
use super::env::EnvOverlay;
use crate::error::{ProviderError, Result};
use serde::de::DeserializeOwned;
use std::ffi::OsString;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use tracing::{Dispatch, Span, debug, error, info};

/// File name the GitOps tool writes its JSON result to.
const OUTPUT_FILE: &str = "output.json";

/// Where the result of an invocation comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputChannel {
    /// No result is expected; stdout is streamed to the log.
    #[default]
    None,
    /// The tool writes JSON to `--output jsonfile=<path>`. The executor picks
    /// a private path per invocation and appends the flag.
    JsonFile,
    /// Stdout is buffered as the result instead of being logged.
    Stdout,
}

/// One subprocess call: program, arguments, environment and result channel.
#[derive(Debug, Clone)]
pub struct Invocation {
    program: String,
    command: CommandLine,
    env: EnvOverlay,
    output: OutputChannel,
    debug: bool,
    stdin: Option<Vec<u8>>,
}

impl Invocation {
    /// Describe a call of `program` with `command`.
    pub fn new(program: &str, command: CommandLine) -> Self {
        Self {
            program: program.to_string(),
            command,
            env: EnvOverlay::new(),
            output: OutputChannel::None,
            debug: false,
            stdin: None,
        }
    }

    /// Set the environment overlay.
    pub fn env(mut self, env: EnvOverlay) -> Self {
        self.env = env;
        self
    }

    /// Set where the result is read from.
    pub fn output(mut self, output: OutputChannel) -> Self {
        self.output = output;
        self
    }

    /// Log stdout at debug instead of info.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Feed `input` to the process on stdin.
    pub fn stdin(mut self, input: Vec<u8>) -> Self {
        self.stdin = Some(input);
        self
    }

    /// The program name, before resolution.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The command line.
    pub fn command(&self) -> &CommandLine {
        &self.command
    }

    /// The environment overlay.
    pub fn overlay(&self) -> &EnvOverlay {
        &self.env
    }
}

/// Result of a successful invocation.
#[derive(Debug, Clone)]
pub struct Completed {
    program: String,
    payload: Option<Vec<u8>>,
}

impl Completed {
    /// Raw result bytes, if the invocation had a result channel.
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    /// Deserialize the result as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let payload = self.payload.as_deref().ok_or_else(|| {
            ProviderError::ParseError(format!("{} produced no result", self.program))
        })?;

        serde_json::from_slice(payload).map_err(|e| {
            ProviderError::ParseError(format!("invalid JSON from {}: {}", self.program, e))
        })
    }
}

/// Output collected from the two streams of a child process.
struct Streams {
    stdout: Option<Vec<u8>>,
    stderr: Vec<String>,
}

/// Runs external programs resolved against a configured binary directory.
#[derive(Debug, Clone, Default)]
pub struct Executor {
    bin_dir: PathBuf,
}

impl Executor {
    /// Create an executor. An empty `bin_dir` means plain `PATH` lookup.
    pub fn new(bin_dir: impl Into<PathBuf>) -> Self {
        Self {
            bin_dir: bin_dir.into(),
        }
    }

    /// The configured binary directory.
    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    /// Resolve `program` to the path that will be executed.
    ///
    /// * absolute `bin_dir`: `bin_dir/program`
    /// * relative `bin_dir`: `PATH` lookup with `bin_dir` prepended
    /// * no `bin_dir`: `PATH` lookup
    pub fn resolve(&self, program: &str) -> Result<PathBuf> {
        if self.bin_dir.as_os_str().is_empty() {
            return which::which(program).map_err(|e| {
                ProviderError::StartError(format!("'{}' not found on PATH: {}", program, e))
            });
        }

        if self.bin_dir.is_absolute() {
            return Ok(self.bin_dir.join(program));
        }

        let cwd = std::env::current_dir().map_err(|e| {
            ProviderError::StartError(format!("failed to determine working directory: {}", e))
        })?;

        which::which_in(program, self.search_path(), cwd).map_err(|e| {
            ProviderError::StartError(format!(
                "'{}' not found in '{}' or on PATH: {}",
                program,
                self.bin_dir.display(),
                e
            ))
        })
    }

    /// `PATH` with the binary directory in front, for lookup and for the child.
    fn search_path(&self) -> Option<OsString> {
        if self.bin_dir.as_os_str().is_empty() {
            return None;
        }

        let bin_dir = if self.bin_dir.is_absolute() {
            self.bin_dir.clone()
        } else {
            std::env::current_dir().ok()?.join(&self.bin_dir)
        };

        let mut paths = vec![bin_dir];
        if let Some(existing) = std::env::var_os("PATH") {
            paths.extend(std::env::split_paths(&existing));
        }
        std::env::join_paths(paths).ok()
    }

    /// Run the invocation to completion.
    ///
    /// Stdout lines are logged at info (debug when the invocation is in debug
    /// mode) and stderr lines at error while the process runs; both streams
    /// are drained concurrently. A non-zero exit, a stream failure or an
    /// unreadable result fails the call.
    pub fn run(&self, invocation: &Invocation) -> Result<Completed> {
        let program = self.resolve(&invocation.program)?;

        let output_dir = match invocation.output {
            OutputChannel::JsonFile => Some(
                tempfile::Builder::new()
                    .prefix("gitops-output-")
                    .tempdir()
                    .map_err(|e| {
                        ProviderError::IoError(format!("failed to create output directory: {}", e))
                    })?,
            ),
            _ => None,
        };
        let output_file = output_dir.as_ref().map(|dir| dir.path().join(OUTPUT_FILE));

        let mut command_line = invocation.command.clone();
        if let Some(path) = &output_file {
            command_line = command_line.flag("--output", &format!("jsonfile={}", path.display()));
        }

        debug!(
            "Executing command: {}",
            command_line.display(&program.display().to_string())
        );
        debug!("Environment: {}", invocation.env);

        let mut command = Command::new(&program);
        command
            .args(command_line.to_args())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });

        if let Some(path) = self.search_path() {
            command.env("PATH", path);
        }
        for (name, value) in invocation.env.iter() {
            command.env(name, value);
        }

        let mut child = command.spawn().map_err(|e| {
            error!("Error starting command: {}", e);
            ProviderError::StartError(format!("'{}': {}", program.display(), e))
        })?;

        let streams = match drain(&mut child, invocation) {
            Ok(streams) => streams,
            Err(e) => {
                // The child may be blocked on a pipe nobody reads any more.
                let _ = child.kill();
                let _ = child.wait();
                error!("Error processing stream: {}", e);
                return Err(ProviderError::StreamError(format!(
                    "{}: {}",
                    invocation.program, e
                )));
            }
        };

        let status = child.wait().map_err(|e| {
            ProviderError::ExecutionError(format!(
                "failed to wait for {}: {}",
                invocation.program, e
            ))
        })?;

        if !status.success() {
            error!("Error running command: {}", describe_status(status));
            return Err(ProviderError::ExecutionError(format!(
                "{} exited with {}: {}",
                invocation.program,
                describe_status(status),
                transcript(&streams.stderr)
            )));
        }

        let payload = match (&output_file, invocation.output) {
            (Some(path), _) => {
                let data = std::fs::read(path).map_err(|e| {
                    ProviderError::ParseError(format!(
                        "failed to read result file '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
                debug!(
                    "JSON result from {}: {}",
                    invocation.program,
                    String::from_utf8_lossy(&data)
                );
                Some(data)
            }
            (None, OutputChannel::Stdout) => streams.stdout,
            (None, _) => None,
        };

        Ok(Completed {
            program: invocation.program.clone(),
            payload,
        })
    }
}

/// Read stdout and stderr to the end on separate threads, feeding stdin if
/// the invocation has input.
fn drain(child: &mut Child, invocation: &Invocation) -> io::Result<Streams> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let stdin = child.stdin.take();

    // Reader threads log into the caller's subscriber and span.
    let dispatch = tracing::dispatcher::get_default(Dispatch::clone);
    let span = Span::current();

    thread::scope(|scope| {
        let writer = stdin.zip(invocation.stdin.as_deref()).map(|(mut pipe, input)| {
            scope.spawn(move || -> io::Result<()> {
                pipe.write_all(input)?;
                // Dropping the pipe closes it so the child sees EOF.
                drop(pipe);
                Ok(())
            })
        });

        let errors = stderr.map(|pipe| {
            let dispatch = dispatch.clone();
            let span = span.clone();
            scope.spawn(move || -> io::Result<Vec<String>> {
                tracing::dispatcher::with_default(&dispatch, || {
                    span.in_scope(|| {
                        let mut lines = Vec::new();
                        for_each_line(pipe, |line| {
                            error!("{}", line);
                            lines.push(line.to_string());
                        })?;
                        Ok(lines)
                    })
                })
            })
        });

        let stdout = match stdout {
            Some(mut pipe) if invocation.output == OutputChannel::Stdout => {
                let mut buffer = Vec::new();
                pipe.read_to_end(&mut buffer)?;
                Some(buffer)
            }
            Some(pipe) => {
                for_each_line(pipe, |line| {
                    if invocation.debug {
                        debug!("{}", line);
                    } else {
                        info!("{}", line);
                    }
                })?;
                None
            }
            None => None,
        };

        let stderr = match errors {
            Some(handle) => join(handle)??,
            None => Vec::new(),
        };

        if let Some(handle) = writer {
            match join(handle)? {
                // The child may legitimately exit without reading all input.
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
                other => other?,
            }
        }

        Ok(Streams { stdout, stderr })
    })
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, T>) -> io::Result<T> {
    handle
        .join()
        .map_err(|_| io::Error::other("output reader thread panicked"))
}

/// Call `f` with every line of `reader`, without the line terminator.
///
/// Invalid UTF-8 is replaced rather than treated as a stream failure.
fn for_each_line<R: Read>(reader: R, mut f: impl FnMut(&str)) -> io::Result<()> {
    let mut reader = BufReader::new(reader);
    let mut buffer = Vec::new();

    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer)? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buffer);
        f(line.trim_end_matches(['\n', '\r']));
    }
}

fn describe_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {}", code),
        None => "signal".to_string(),
    }
}

fn transcript(stderr: &[String]) -> String {
    if stderr.is_empty() {
        "no error output".to_string()
    } else {
        stderr.join("\n")
    }
}
