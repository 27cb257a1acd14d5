use std::io::Write;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{Error, Result};

pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<()>;
}

/// Pipes text into the platform's clipboard tool.
#[derive(Debug, Default)]
pub struct CommandClipboard;

const TOOLS: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
    ("pbcopy", &[]),
    ("clip", &[]),
];

impl CommandClipboard {
    fn pipe(tool: &str, args: &[&str], text: &str) -> Result<()> {
        let mut child = Command::new(tool)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(text.as_bytes()) {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e.into());
            }
        }
        let status = child.wait()?;
        if status.success() {
            Ok(())
        } else {
            Err(Error::Clipboard(format!("{tool} exited with {status}")))
        }
    }
}

impl Clipboard for CommandClipboard {
    fn write_text(&mut self, text: &str) -> Result<()> {
        for &(tool, args) in TOOLS {
            match Self::pipe(tool, args, text) {
                Ok(()) => {
                    debug!(tool, "Copied to clipboard");
                    return Ok(());
                }
                Err(e) => debug!(tool, "Clipboard tool failed: {}", e),
            }
        }
        Err(Error::Clipboard("no clipboard tool available".to_string()))
    }
}
