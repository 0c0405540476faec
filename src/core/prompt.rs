use std::io::{BufRead, Write};

use crate::core::error::MigrateError;

/// Line-oriented operator prompts over any reader/writer pair
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `label` and read one trimmed line.
    /// Running out of input is an error rather than an empty answer.
    pub fn ask(&mut self, label: &str) -> Result<String, MigrateError> {
        write!(self.output, "{}: ", label)
            .and_then(|_| self.output.flush())
            .map_err(|e| MigrateError::Config(format!("Failed to write prompt '{}': {}", label, e)))?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| MigrateError::Config(format!("Failed to read {}: {}", label, e)))?;

        if read == 0 {
            return Err(MigrateError::Config(format!(
                "Input closed before {} was entered",
                label
            )));
        }

        Ok(line.trim().to_string())
    }

    /// Use the preset value when there is one, otherwise prompt
    pub fn value_or_ask(&mut self, preset: Option<&str>, label: &str) -> Result<String, MigrateError> {
        match preset {
            Some(value) => Ok(value.to_string()),
            None => self.ask(label),
        }
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }
}
