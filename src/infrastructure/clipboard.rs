//! System clipboard with a terminal fallback

use std::io::{self, Write};

use anyhow::{Context, Result};
use arboard::Clipboard;
use base64::Engine;

/// How the text reached the clipboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyRoute {
    System,
    /// OSC 52 escape; the terminal decides whether to honour it
    Terminal,
}

/// Copy via the system clipboard, falling back to OSC 52 when no clipboard
/// is reachable (SSH sessions, bare consoles).
pub fn copy_text(text: &str) -> Result<CopyRoute> {
    match Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text)) {
        Ok(()) => Ok(CopyRoute::System),
        Err(err) => {
            log::warn!("system clipboard unavailable ({}), using OSC 52", err);
            osc52_copy(text)?;
            Ok(CopyRoute::Terminal)
        }
    }
}

pub fn osc52_sequence(text: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{}\x07", encoded)
}

fn osc52_copy(text: &str) -> Result<()> {
    let mut stdout = io::stdout();
    stdout
        .write_all(osc52_sequence(text).as_bytes())
        .context("write OSC 52 sequence")?;
    stdout.flush().context("flush stdout")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_osc52_sequence() {
        assert_eq!(osc52_sequence("0xab\n0xcd"), "\x1b]52;c;MHhhYgoweGNk\x07");
    }
}
