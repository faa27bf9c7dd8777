use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

static CWD_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub(crate) struct DirGuard {
    original: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl DirGuard {
    pub(crate) fn new(new_dir: &Path) -> Self {
        // Changing the process current working directory is global and not thread-safe.
        // Lock it so tests don't race even if a #[serial] annotation is missed.
        let lock = CWD_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(new_dir).unwrap();
        Self {
            original,
            _lock: lock,
        }
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.original);
    }
}

/// A shell script standing in for igc, kubectl or kubeseal.
///
/// The script records its argv to `<dir>/<name>.args` (one per line) and its
/// environment to `<dir>/<name>.env`, writes `json` to the path given by
/// `--output jsonfile=...`, prints `stdout`/`stderr` and exits with `exit`.
#[derive(Default)]
pub(crate) struct Stub {
    name: String,
    json: Option<String>,
    stdout: Option<String>,
    stderr: Option<String>,
    script: Option<String>,
    exit: i32,
}

impl Stub {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub(crate) fn json(mut self, json: &str) -> Self {
        self.json = Some(json.to_string());
        self
    }

    pub(crate) fn stdout(mut self, text: &str) -> Self {
        self.stdout = Some(text.to_string());
        self
    }

    pub(crate) fn stderr(mut self, text: &str) -> Self {
        self.stderr = Some(text.to_string());
        self
    }

    /// Extra shell run after the canned output.
    pub(crate) fn script(mut self, script: &str) -> Self {
        self.script = Some(script.to_string());
        self
    }

    pub(crate) fn exit(mut self, code: i32) -> Self {
        self.exit = code;
        self
    }

    #[cfg(unix)]
    pub(crate) fn install(self, dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let mut body = String::from("#!/bin/sh\n");
        body.push_str(&format!(
            "printf '%s\\n' \"$@\" > \"{dir}/{name}.args\"\nenv > \"{dir}/{name}.env\"\n",
            dir = dir.display(),
            name = self.name
        ));
        body.push_str(
            "out=\"\"\nprev=\"\"\nfor a in \"$@\"; do\n  if [ \"$prev\" = \"--output\" ]; then out=\"${a#jsonfile=}\"; fi\n  prev=\"$a\"\ndone\n",
        );
        if let Some(json) = &self.json {
            body.push_str(&format!(
                "if [ -n \"$out\" ]; then\ncat > \"$out\" <<'STUB_JSON'\n{}\nSTUB_JSON\nfi\n",
                json
            ));
        }
        if let Some(stdout) = &self.stdout {
            body.push_str(&format!("cat <<'STUB_OUT'\n{}\nSTUB_OUT\n", stdout));
        }
        if let Some(stderr) = &self.stderr {
            body.push_str(&format!("cat >&2 <<'STUB_ERR'\n{}\nSTUB_ERR\n", stderr));
        }
        if let Some(script) = &self.script {
            body.push_str(script);
            body.push('\n');
        }
        body.push_str(&format!("exit {}\n", self.exit));

        let path = dir.join(&self.name);
        std::fs::write(&path, body).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }
}

/// Arguments the stub named `name` was last called with.
pub(crate) fn recorded_args(dir: &Path, name: &str) -> Vec<String> {
    std::fs::read_to_string(dir.join(format!("{}.args", name)))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Environment the stub named `name` was last called with.
pub(crate) fn recorded_env(dir: &Path, name: &str) -> String {
    std::fs::read_to_string(dir.join(format!("{}.env", name))).unwrap_or_default()
}

/// Whether the stub named `name` ran at all.
pub(crate) fn was_called(dir: &Path, name: &str) -> bool {
    dir.join(format!("{}.args", name)).exists()
}

#[derive(Clone, Default)]
pub(crate) struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub(crate) fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(|p| p.into_inner());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with every log event written to a buffer, returning both.
pub(crate) fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .without_time()
        .with_writer(move || writer.clone())
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    (result, buffer.contents())
}
