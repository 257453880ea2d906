//! Classifier seam for inbox processing

#![allow(clippy::result_large_err)]

use sb_core::errors::{Result, SbError, SecondBrainError};
use std::io::Write;
use std::process::{Command, Stdio};

/// Something that answers the sorter prompt with (hopefully) JSON
pub trait Classifier {
    /// Model name recorded on every inbox row this classifier decides
    fn model(&self) -> &str;

    /// Run the prompt and return the raw model output
    fn classify(&self, prompt: &str) -> Result<String>;
}

/// Classifier backed by a local `ollama run <model>` process
#[derive(Debug, Clone)]
pub struct OllamaClassifier {
    program: String,
    model: String,
}

impl OllamaClassifier {
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_program("ollama", model)
    }

    /// Use a specific executable instead of `ollama` from PATH
    pub fn with_program(program: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            model: model.into(),
        }
    }
}

impl Classifier for OllamaClassifier {
    fn model(&self) -> &str {
        &self.model
    }

    fn classify(&self, prompt: &str) -> Result<String> {
        let failed = |reason: String| -> SbError {
            SecondBrainError::ClassifierFailed { reason }.into()
        };

        let mut child = Command::new(&self.program)
            .arg("run")
            .arg(&self.model)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| failed(format!("cannot start {}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(prompt.as_bytes()) {
                drop(stdin);
                // reap before reporting
                let _ = child.kill();
                let _ = child.wait();
                return Err(failed(format!("cannot write prompt: {}", e)));
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| failed(format!("cannot read output: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failed(format!("ollama failed: {}", stderr.trim())));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        tracing::debug!(model = %self.model, bytes = stdout.len(), "classifier output");
        Ok(stdout)
    }
}
