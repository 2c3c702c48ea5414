use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrustError {
    #[error("failed to read root certificate {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse root certificate: {0}")]
    Parse(String),

    #[error("no install strategy available: none of the known trust anchor directories exist")]
    NoStrategy,

    #[error("command {command:?} failed: {reason}{}", format_output(.output))]
    Execution {
        command: String,
        reason: String,
        output: String,
    },
}

impl TrustError {
    pub fn execution(argv: &[String], reason: impl Into<String>, output: &[u8]) -> Self {
        Self::Execution {
            command: argv.join(" "),
            reason: reason.into(),
            output: String::from_utf8_lossy(output).trim().to_string(),
        }
    }
}

fn format_output(output: &str) -> String {
    if output.is_empty() {
        String::new()
    } else {
        format!("\noutput:\n{}", output)
    }
}
