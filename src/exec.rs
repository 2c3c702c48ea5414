use std::{
    env,
    io::{self, ErrorKind, Write},
    process::{Command, Stdio},
    thread,
};

use crate::{error::TrustError, logging};

const SUDO: &str = "sudo";
const SUDO_PROMPT: &str = "--prompt=Sudo password:";

/// Runs an external command and hands back its combined stdout and stderr.
pub trait CommandRunner {
    fn run(&self, argv: &[String], stdin: Option<&[u8]>) -> Result<Vec<u8>, TrustError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Elevation {
    /// Prefix with sudo unless the effective user is already root.
    #[default]
    Auto,
    Never,
}

impl Elevation {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "never" => Some(Self::Never),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Never => "never",
        }
    }
}

/// Spawns real processes, one attempt each, no timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner {
    elevation: Elevation,
}

impl SystemRunner {
    pub fn new(elevation: Elevation) -> Self {
        Self { elevation }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, argv: &[String], stdin: Option<&[u8]>) -> Result<Vec<u8>, TrustError> {
        let full = elevated_argv(argv, self.elevation, is_root(), || has_command(SUDO))?;
        execute(&full, stdin)
    }
}

/// Run `full` exactly as given. Errors name `full`, sudo prefix included.
fn execute(full: &[String], stdin: Option<&[u8]>) -> Result<Vec<u8>, TrustError> {
    let Some((program, args)) = full.split_first() else {
        return Err(TrustError::execution(full, "empty command", b""));
    };

    logging::debug("EXEC", &format!("run command={:?}", full.join(" ")));

    let mut command = Command::new(program);
    command
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::inherit()
        });

    let mut child = command
        .spawn()
        .map_err(|e| TrustError::execution(full, format!("failed to start: {}", e), b""))?;

    // stdin is fed from its own thread while wait_with_output drains stdout and
    // stderr, so a child echoing its input (tee) cannot fill a pipe and stall us.
    let (output, written) = thread::scope(|scope| {
        let writer = match (stdin, child.stdin.take()) {
            (Some(input), Some(mut pipe)) => Some(scope.spawn(move || {
                match pipe.write_all(input) {
                    // The child stopped reading; its exit status and output say why.
                    Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
                    other => other,
                }
            })),
            _ => None,
        };
        let output = child.wait_with_output();
        let written = match writer {
            Some(handle) => handle
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked"))),
            None => Ok(()),
        };
        (output, written)
    });

    let output = output
        .map_err(|e| TrustError::execution(full, format!("failed to wait: {}", e), b""))?;

    let mut combined = output.stdout;
    combined.extend_from_slice(&output.stderr);

    if !output.status.success() {
        return Err(TrustError::execution(
            full,
            output.status.to_string(),
            &combined,
        ));
    }
    if let Err(e) = written {
        return Err(TrustError::execution(
            full,
            format!("failed to write stdin: {}", e),
            &combined,
        ));
    }

    Ok(combined)
}

/// Prints what would run and touches nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunRunner;

impl CommandRunner for DryRunRunner {
    fn run(&self, argv: &[String], stdin: Option<&[u8]>) -> Result<Vec<u8>, TrustError> {
        let line = match stdin {
            Some(input) => format!("{} (stdin: {} bytes)", argv.join(" "), input.len()),
            None => argv.join(" "),
        };
        logging::info("EXEC", &format!("dry-run command={:?}", line));
        println!("would run: {}", line);
        Ok(Vec::new())
    }
}

/// Decide the final argv. Root never gets sudo; a missing sudo is an error
/// rather than a silent unprivileged attempt.
fn elevated_argv(
    argv: &[String],
    elevation: Elevation,
    is_root: bool,
    sudo_available: impl FnOnce() -> bool,
) -> Result<Vec<String>, TrustError> {
    if argv.is_empty() {
        return Err(TrustError::execution(argv, "empty command", b""));
    }
    if elevation == Elevation::Never || is_root {
        return Ok(argv.to_vec());
    }
    if !sudo_available() {
        return Err(TrustError::execution(
            argv,
            "elevated privileges are required but sudo is not available",
            b"",
        ));
    }

    let mut full = Vec::with_capacity(argv.len() + 3);
    full.push(SUDO.to_string());
    full.push(SUDO_PROMPT.to_string());
    full.push("--".to_string());
    full.extend_from_slice(argv);
    Ok(full)
}

#[cfg(unix)]
fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn is_root() -> bool {
    false
}

/// True when some `PATH` entry holds a regular file called `name`.
fn has_command(name: &str) -> bool {
    env::var_os("PATH")
        .map(|paths| env::split_paths(&paths).any(|dir| dir.join(name).is_file()))
        .unwrap_or(false)
}
