//! External classifier seam.
//!
//! The classifier is a separate process invoked as
//! `<command...> --image <path>`. It must exit and write a UTF-8 JSON report
//! to stdout; exit plus stdout text is the whole protocol. [`Classifier`]
//! returns that text; decoding it is the pipeline's job.

use std::future::Future;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::InspectionError;

/// Runs the external classification step for one sample.
pub trait Classifier: Send + Sync + 'static {
    /// Classify `sample`, returning the raw (trimmed) report text.
    fn classify(&self, sample: &Path) -> impl Future<Output = Result<String, InspectionError>> + Send;
}

/// Classifier backed by a local process.
///
/// The child is not killed if the caller stops waiting: dropping the
/// future abandons the process and leaves reaping to the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessClassifier {
    program: String,
    args: Vec<String>,
}

impl ProcessClassifier {
    /// `command[0]` is the program, the rest are leading arguments
    /// (e.g. `["python3", "classify.py"]`). Returns `None` for an empty command.
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command_line(&self, sample: &Path) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line.push_str(" --image ");
        line.push_str(&sample.display().to_string());
        line
    }
}

impl Classifier for ProcessClassifier {
    async fn classify(&self, sample: &Path) -> Result<String, InspectionError> {
        info!(command = %self.command_line(sample), "launching classifier");

        let child = Command::new(&self.program)
            .args(&self.args)
            .arg("--image")
            .arg(sample)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(false)
            .spawn()
            .map_err(|source| InspectionError::ClassifierLaunch {
                program: self.program.clone(),
                source,
            })?;

        let output = child.wait_with_output().await.map_err(|e| {
            InspectionError::ClassifierMalformedOutput {
                reason: format!("failed to read classifier output: {e}"),
                raw: String::new(),
            }
        })?;

        if !output.status.success() {
            warn!(status = %output.status, "classifier exited unsuccessfully");
        }
        if !output.stderr.is_empty() {
            debug!(stderr = %String::from_utf8_lossy(&output.stderr).trim(), "classifier stderr");
        }

        match String::from_utf8(output.stdout) {
            Ok(text) => Ok(text.trim().to_string()),
            Err(e) => Err(InspectionError::ClassifierMalformedOutput {
                reason: "classifier stdout is not valid UTF-8".to_string(),
                raw: String::from_utf8_lossy(e.as_bytes()).into_owned(),
            }),
        }
    }
}
