use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Audible/visual feedback signal
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Cue {
    /// Terminal bell (visual flash on terminals configured for it)
    #[default]
    Beep,
    /// Sound file played through the system audio player
    File(PathBuf),
    /// No feedback
    Silent,
}

impl From<String> for Cue {
    fn from(value: String) -> Self {
        let value = value.trim();
        match value.to_lowercase().as_str() {
            "beep" => Cue::Beep,
            "" | "none" => Cue::Silent,
            _ => Cue::File(PathBuf::from(value)),
        }
    }
}

impl From<Cue> for String {
    fn from(cue: Cue) -> Self {
        cue.to_string()
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cue::Beep => write!(f, "beep"),
            Cue::File(path) => write!(f, "{}", path.display()),
            Cue::Silent => write!(f, "none"),
        }
    }
}

/// Feedback channel for cues and user-facing messages
/// Fire-and-forget: failures are logged, never returned
pub trait Feedback {
    /// Play a cue
    fn play_cue(&self, cue: &Cue);

    /// Show an informational message to the user
    fn message(&self, text: &str);
}

/// Feedback on the controlling terminal
/// Bell and messages go to stderr so stdout stays clean for pasted text
pub struct TerminalFeedback;

impl TerminalFeedback {
    fn play_file(path: &Path) {
        for player in ["paplay", "aplay"] {
            let spawned = Command::new(player)
                .arg(path)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn();

            match spawned {
                Ok(mut child) => {
                    // Reap the player once it finishes
                    std::thread::spawn(move || {
                        let _ = child.wait();
                    });
                    log::debug!("Playing {:?} with {}", path, player);
                    return;
                }
                Err(e) => log::debug!("{} unavailable: {}", player, e),
            }
        }

        log::warn!("No audio player found to play {:?}", path);
    }
}

impl Feedback for TerminalFeedback {
    fn play_cue(&self, cue: &Cue) {
        match cue {
            Cue::Beep => {
                let mut err = io::stderr().lock();
                let _ = err.write_all(b"\x07");
                let _ = err.flush();
            }
            Cue::File(path) => Self::play_file(path),
            Cue::Silent => {}
        }
    }

    fn message(&self, text: &str) {
        log::debug!("{}", text);
        eprintln!("clipmon: {}", text);
    }
}
