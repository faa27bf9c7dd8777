//! Sealing secret manifests with kubeseal.

use crate::error::{ProviderError, Result};
use crate::exec::{CommandLine, Invocation, KUBECTL_BINARY, KUBESEAL_BINARY, OutputChannel};
use crate::provider::Provider;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File the sealing certificate is written to inside the scratch directory.
pub const CERT_FILE_NAME: &str = "kubeseal.crt";

/// Write the sealing certificate to `dir/kubeseal.crt`.
pub fn write_cert(dir: &Path, cert: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| io_error("create directory", dir, e))?;

    let path = dir.join(CERT_FILE_NAME);
    info!("Writing cert to file: {}", path.display());
    std::fs::write(&path, cert).map_err(|e| io_error("write certificate", &path, e))?;

    Ok(path)
}

/// Seal one manifest into `dest`.
///
/// The manifest is fed to `kubeseal --cert <cert> --format yaml`. With
/// annotations the sealed output is then passed through
/// `kubectl annotate -f - --local=true` before it is written.
pub fn seal_file(
    provider: &Provider,
    cert_file: &Path,
    source: &Path,
    dest: &Path,
    annotations: &[String],
) -> Result<PathBuf> {
    debug!("Reading file contents: {}", source.display());
    let contents = std::fs::read(source).map_err(|e| io_error("read", source, e))?;

    let seal = Invocation::new(
        KUBESEAL_BINARY,
        CommandLine::default()
            .flag("--cert", &cert_file.display().to_string())
            .flag("--format", "yaml"),
    )
    .output(OutputChannel::Stdout)
    .stdin(contents);
    let sealed = provider.run(&seal)?;
    let mut output = sealed.payload().unwrap_or_default().to_vec();

    if !annotations.is_empty() {
        debug!("Applying {} annotation(s)", annotations.len());
        let mut command = CommandLine::new("annotate")
            .flag("-f", "-")
            .positional("--local=true")
            .positional("--dry-run=client")
            .positional("--output=yaml");
        for annotation in annotations {
            command = command.positional(annotation);
        }

        let annotate = Invocation::new(KUBECTL_BINARY, command)
            .output(OutputChannel::Stdout)
            .stdin(output);
        output = provider
            .run(&annotate)?
            .payload()
            .unwrap_or_default()
            .to_vec();
    }

    std::fs::write(dest, output).map_err(|e| io_error("write sealed secret", dest, e))?;
    debug!("Sealed file written to: {}", dest.display());

    Ok(dest.to_path_buf())
}

/// Seal every `*yaml` file directly inside `source_dir` into `dest_dir`
/// under the same file name. Other files are skipped.
pub fn seal_dir(
    provider: &Provider,
    cert_file: &Path,
    source_dir: &Path,
    dest_dir: &Path,
    annotations: &[String],
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dest_dir).map_err(|e| io_error("create directory", dest_dir, e))?;

    let entries =
        std::fs::read_dir(source_dir).map_err(|e| io_error("read directory", source_dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| io_error("read directory", source_dir, e))?;
        if entry.path().is_file() {
            files.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    files.sort();

    let mut sealed = Vec::new();
    for name in files {
        if !name.ends_with("yaml") {
            debug!("Skipping file because it is not a yaml file: {}", name);
            continue;
        }

        info!("Encrypting file: {}", name);
        sealed.push(seal_file(
            provider,
            cert_file,
            &source_dir.join(&name),
            &dest_dir.join(&name),
            annotations,
        )?);
    }

    Ok(sealed)
}

fn io_error(action: &str, path: &Path, e: std::io::Error) -> ProviderError {
    ProviderError::IoError(format!("failed to {} '{}': {}", action, path.display(), e))
}
