use anyhow::Result;
use arboard::Clipboard;
#[cfg(target_os = "linux")]
use arboard::SetExtLinux;

/// Hidden argument that turns a child process into the clipboard owner.
pub const DAEMON_FLAG: &str = "__treepick_clipboard_daemon";

// X11/Wayland clipboards die with their owner, so a detached child keeps serving the text.
#[cfg(target_os = "linux")]
fn run_daemon_mode() -> Result<()> {
    let text = std::io::read_to_string(std::io::stdin())?;
    let mut clipboard = Clipboard::new()?;
    // blocks until another program takes the clipboard over
    clipboard.set().wait().text(text)?;
    Ok(())
}

/// Runs the clipboard daemon when the hidden flag is present.
/// Returns Ok(true) if this process was the daemon and should exit.
pub fn check_and_run_daemon_if_requested() -> Result<bool> {
    if !std::env::args().any(|a| a == DAEMON_FLAG) {
        return Ok(false);
    }
    #[cfg(target_os = "linux")]
    {
        run_daemon_mode()?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        tracing::warn!("{} used on a non-Linux system, ignoring", DAEMON_FLAG);
    }
    Ok(true)
}

pub fn copy_text_to_clipboard(text: String) -> Result<()> {
    #[cfg(not(target_os = "linux"))]
    {
        let mut clipboard = Clipboard::new()?;
        clipboard.set_text(text)?;
    }

    #[cfg(target_os = "linux")]
    {
        use std::io::Write;
        use std::process::{Command, Stdio};

        let mut child = Command::new(std::env::current_exe()?)
            .arg(DAEMON_FLAG)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .current_dir("/")
            .spawn()?;

        let Some(mut stdin) = child.stdin.take() else {
            return Err(anyhow::anyhow!("Failed to get stdin for clipboard daemon"));
        };
        stdin.write_all(text.as_bytes())?;
        stdin.flush()?;
        tracing::debug!(pid = child.id(), "clipboard daemon started");
    }
    Ok(())
}
