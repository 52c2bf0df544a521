use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use env_logger::{Builder, Env, Target};
use log::LevelFilter;

use crate::error::GameError;

/// Held stderr output beyond this is dropped and counted.
const HOLD_LIMIT: usize = 1 << 20;

#[derive(Default)]
struct Held {
    holding: bool,
    buf: Vec<u8>,
    dropped: usize,
}

fn lock(held: &Mutex<Held>) -> MutexGuard<'_, Held> {
    held.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// stderr that can be told to hold its output while the screen is taken.
struct HeldStderr(Arc<Mutex<Held>>);

impl Write for HeldStderr {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        let mut held = lock(&self.0);
        if !held.holding {
            drop(held);
            return io::stderr().write(bytes);
        }
        if held.buf.len() + bytes.len() > HOLD_LIMIT {
            held.dropped += bytes.len();
        } else {
            held.buf.extend_from_slice(bytes);
        }
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

/// Handle on the installed logger's stderr output.
///
/// `hold` before entering the alternate screen and `release` after
/// leaving it, so log lines never draw over the game. With a log file
/// both are no-ops.
#[derive(Clone, Default)]
pub struct LogHandle {
    held: Option<Arc<Mutex<Held>>>,
}

impl LogHandle {
    pub fn hold(&self) {
        if let Some(held) = &self.held {
            lock(held).holding = true;
        }
    }

    /// Stop holding and print everything held back to stderr.
    pub fn release(&self) {
        let text = self.take_held();
        if !text.is_empty() {
            let _ = io::stderr().write_all(&text);
        }
    }

    fn take_held(&self) -> Vec<u8> {
        let Some(held) = &self.held else { return Vec::new() };
        let mut held = lock(held);
        held.holding = false;
        let mut text = std::mem::take(&mut held.buf);
        if held.dropped > 0 {
            text.extend_from_slice(
                format!("({} bytes of log output dropped)\n", held.dropped).as_bytes(),
            );
            held.dropped = 0;
        }
        text
    }
}

/// Initializes the global logger.
///
/// Only warnings and errors are shown unless `verbose` is set, in which
/// case debug messages are printed too. `RUST_LOG` overrides both.
///
/// The terminal belongs to the game while it runs, so with `log_file` the
/// output is written there instead of stderr. Without one, stderr output
/// can be held back through the returned handle.
pub fn init(verbose: bool, log_file: Option<&Path>) -> Result<LogHandle, GameError> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let env = Env::default().default_filter_or(level.to_string());
    let mut builder = Builder::from_env(env);

    let handle = match log_file {
        Some(path) => {
            let file = File::create(path).map_err(|source| GameError::LogFile {
                path: path.to_path_buf(),
                source,
            })?;
            builder.target(Target::Pipe(Box::new(file)));
            LogHandle::default()
        }
        None => {
            let held = Arc::new(Mutex::new(Held::default()));
            builder.target(Target::Pipe(Box::new(HeldStderr(Arc::clone(&held)))));
            LogHandle { held: Some(held) }
        }
    };

    // `try_init` only fails if a logger was already set.
    let _ = builder.try_init();
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held_pair() -> (LogHandle, HeldStderr) {
        let held = Arc::new(Mutex::new(Held::default()));
        (LogHandle { held: Some(Arc::clone(&held)) }, HeldStderr(held))
    }

    #[test]
    fn init_twice_is_harmless() {
        assert!(init(false, None).is_ok());
        assert!(init(true, None).is_ok());
    }

    #[test]
    fn unwritable_log_file_is_reported() {
        let dir = tempfile::tempdir().expect("temp dir");
        let bad = dir.path().join("missing").join("game.log");
        let err = init(false, Some(&bad)).err();
        assert!(matches!(err, Some(GameError::LogFile { .. })));
    }

    #[test]
    fn held_output_waits_for_release() {
        let (handle, mut stderr) = held_pair();
        handle.hold();
        stderr.write_all(b"[WARN] spawn occupied\n").expect("write");
        stderr.write_all(b"[WARN] grid is full\n").expect("write");
        assert_eq!(handle.take_held(), b"[WARN] spawn occupied\n[WARN] grid is full\n");
        assert!(handle.take_held().is_empty());
    }

    #[test]
    fn nothing_is_held_before_hold() {
        let (handle, mut stderr) = held_pair();
        stderr.write_all(b"straight through\n").expect("write");
        assert!(handle.take_held().is_empty());
    }

    #[test]
    fn overflow_is_counted_not_kept() {
        let (handle, mut stderr) = held_pair();
        handle.hold();
        stderr.write_all(&vec![b'x'; HOLD_LIMIT]).expect("write");
        stderr.write_all(b"late line\n").expect("write");
        let text = handle.take_held();
        assert_eq!(&text[..HOLD_LIMIT], &vec![b'x'; HOLD_LIMIT][..]);
        assert_eq!(&text[HOLD_LIMIT..], b"(10 bytes of log output dropped)\n");
    }

    #[test]
    fn file_logging_has_nothing_to_hold() {
        let handle = LogHandle::default();
        handle.hold();
        assert!(handle.take_held().is_empty());
    }
}
