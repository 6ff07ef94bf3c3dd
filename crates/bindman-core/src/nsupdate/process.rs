// # nsupdate Process Transport
//
// Runs the `nsupdate` utility against a session script written to a
// uniquely named temporary file:
//
// ```text
// nsupdate -k <base_path>/<key_file> -v <base_path>/nsupdate-XXXXXX.txt
// ```
//
// `-v` makes nsupdate use TCP. The script file is removed once the process
// exits, whatever the outcome, unless debug mode is on.

use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::process::Command;

use crate::config::ManagerConfig;
use crate::error::{Error, Result};
use crate::traits::UpdateTransport;

/// Default update utility
pub const NSUPDATE_PROGRAM: &str = "nsupdate";

/// [`UpdateTransport`] running the `nsupdate` utility as a child process
#[derive(Debug, Clone)]
pub struct NsUpdateProcess {
    program: PathBuf,
    key_file_path: PathBuf,
    script_dir: PathBuf,
    debug: bool,
}

impl NsUpdateProcess {
    /// Create a transport from the manager configuration
    pub fn new(config: &ManagerConfig) -> Self {
        Self {
            program: PathBuf::from(NSUPDATE_PROGRAM),
            key_file_path: config.key_file_path(),
            script_dir: config.base_path().to_path_buf(),
            debug: config.debug(),
        }
    }

    /// Use another program instead of `nsupdate`
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Program that will be run
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Write `script` to a fresh temporary file under the script directory
    async fn write_script(&self, script: &str) -> Result<NamedTempFile> {
        let dir = self.script_dir.clone();
        let script = script.to_string();

        tokio::task::spawn_blocking(move || -> Result<NamedTempFile> {
            let mut file = tempfile::Builder::new()
                .prefix("nsupdate-")
                .suffix(".txt")
                .tempfile_in(dir)?;
            file.write_all(script.as_bytes())?;
            file.flush()?;
            Ok(file)
        })
        .await
        .map_err(|e| Error::Other(format!("Session script writer panicked: {}", e)))?
    }

    async fn run(&self, script_path: &Path) -> Result<()> {
        let output = Command::new(&self.program)
            .arg("-k")
            .arg(&self.key_file_path)
            .arg("-v")
            .arg(script_path)
            .output()
            .await
            .map_err(|e| {
                Error::execution(
                    format!("failed to launch {}", self.program.display()),
                    e.to_string(),
                )
            })?;

        if output.status.success() {
            return Ok(());
        }

        let mut captured = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            if !captured.is_empty() {
                captured.push('\n');
            }
            captured.push_str(stdout.trim());
        }

        Err(Error::execution(
            format!("{} exited with {}", self.program.display(), output.status),
            captured,
        ))
    }
}

#[async_trait]
impl UpdateTransport for NsUpdateProcess {
    async fn submit(&self, script: &str) -> Result<()> {
        let script_file = self.write_script(script).await?;
        let result = self.run(script_file.path()).await;

        if self.debug {
            match script_file.keep() {
                Ok((_, path)) => tracing::warn!("Debug mode: kept session script {}", path.display()),
                Err(e) => tracing::warn!("Debug mode: could not keep session script: {}", e),
            }
        }
        // Otherwise the script is removed when `script_file` drops

        result
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config(base: &Path, debug: bool) -> ManagerConfig {
        ManagerConfig::builder()
            .with_server("localhost")
            .with_key_file("Ktest.com.+157+50086.key")
            .with_zone("test.com")
            .with_base_path(base)
            .with_debug(debug)
            .build()
            .unwrap()
    }

    fn leftover_scripts(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("nsupdate-"))
            .count()
    }

    #[tokio::test]
    async fn test_success_removes_script() {
        let dir = tempdir().unwrap();
        let transport = NsUpdateProcess::new(&config(dir.path(), false)).with_program("true");

        transport.submit("server localhost 53\nsend\n").await.unwrap();
        assert_eq!(leftover_scripts(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_failure_is_execution_error_and_removes_script() {
        let dir = tempdir().unwrap();
        let transport = NsUpdateProcess::new(&config(dir.path(), false)).with_program("false");

        let err = transport.submit("send\n").await.unwrap_err();
        assert!(matches!(err, Error::Execution { .. }), "got {:?}", err);
        assert_eq!(leftover_scripts(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_launch_failure_is_execution_error() {
        let dir = tempdir().unwrap();
        let transport = NsUpdateProcess::new(&config(dir.path(), false))
            .with_program(dir.path().join("no-such-nsupdate"));

        let err = transport.submit("send\n").await.unwrap_err();
        assert!(err.to_string().contains("failed to launch"), "got {}", err);
        assert_eq!(leftover_scripts(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_captured_output_is_embedded() {
        let dir = tempdir().unwrap();
        // `cat -k` rejects the unknown flag and reports it on stderr
        let transport = NsUpdateProcess::new(&config(dir.path(), false)).with_program("cat");

        match transport.submit("send\n").await.unwrap_err() {
            Error::Execution { output, .. } => assert!(!output.is_empty()),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_debug_keeps_script() {
        let dir = tempdir().unwrap();
        let transport = NsUpdateProcess::new(&config(dir.path(), true)).with_program("true");

        transport.submit("server localhost 53\nsend\n").await.unwrap();
        assert_eq!(leftover_scripts(dir.path()), 1);
    }

    #[test]
    fn test_default_program() {
        let transport = NsUpdateProcess::new(&config(Path::new("./data"), false));
        assert_eq!(transport.program(), Path::new("nsupdate"));
    }
}
