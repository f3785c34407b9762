//! Pronunciation side effect for the word being quizzed

use std::process::{Command, Stdio};
use std::thread;
use tracing::debug;

/// Fire-and-forget text-to-speech. Implementations must not block and must
/// swallow their own failures.
pub trait Pronouncer {
    fn speak(&self, text: &str);
}

/// No speech capability available
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentPronouncer;

impl Pronouncer for SilentPronouncer {
    fn speak(&self, _text: &str) {}
}

/// Spawns an external TTS program (e.g. `espeak -v en-us`) with the text as
/// its last argument. The child is reaped on a detached thread so the caller
/// never waits on it.
#[derive(Debug, Clone)]
pub struct CommandPronouncer {
    program: String,
    args: Vec<String>,
}

impl CommandPronouncer {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Build from a whitespace separated command line such as `"say -v Samantha"`
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let program = parts.next()?;
        Some(Self {
            program: program.to_string(),
            args: parts.map(|p| p.to_string()).collect(),
        })
    }
}

impl Pronouncer for CommandPronouncer {
    fn speak(&self, text: &str) {
        let spawned = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                debug!(program = %self.program, error = %e, "speech unavailable");
                return;
            }
        };

        let reaper = thread::Builder::new()
            .name("speech-reaper".to_string())
            .spawn(move || {
                let _ = child.wait();
            });
        if let Err(e) = reaper {
            debug!(program = %self.program, error = %e, "could not reap speech process");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_is_split_into_program_and_args() {
        let tts = CommandPronouncer::from_command_line("espeak -v en-us").unwrap();
        assert_eq!(tts.program, "espeak");
        assert_eq!(tts.args, vec!["-v", "en-us"]);
        assert!(CommandPronouncer::from_command_line("   ").is_none());
    }

    #[test]
    fn missing_program_is_tolerated() {
        let tts = CommandPronouncer::new("definitely-not-a-tts-binary-9f2c", &[]);
        tts.speak("cat");
        SilentPronouncer.speak("cat");
    }

    /// Children of this process that have exited but were not reaped
    #[cfg(target_os = "linux")]
    fn zombie_children() -> usize {
        let me = std::process::id().to_string();
        std::fs::read_dir("/proc")
            .unwrap()
            .filter_map(|entry| std::fs::read_to_string(entry.ok()?.path().join("stat")).ok())
            .filter(|stat| {
                // fields after the parenthesised command name: state, ppid, ...
                let Some((_, rest)) = stat.rsplit_once(')') else {
                    return false;
                };
                let mut fields = rest.split_whitespace();
                fields.next() == Some("Z") && fields.next() == Some(me.as_str())
            })
            .count()
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn finished_speech_processes_are_reaped() {
        let tts = CommandPronouncer::new("true", &[]);
        for _ in 0..5 {
            tts.speak("cat");
        }

        let mut zombies = zombie_children();
        for _ in 0..50 {
            if zombies == 0 {
                break;
            }
            thread::sleep(std::time::Duration::from_millis(100));
            zombies = zombie_children();
        }
        assert_eq!(zombies, 0);
    }
}
