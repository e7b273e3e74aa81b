use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use crate::errors::{CleanError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Interactive confirmation capability.
///
/// The destructive destination-clearing step goes through this seam so the
/// decision logic can be exercised without a terminal.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// Prompts on stdout and reads the reply from stdin. `y`/`yes` accepts.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        print!("{prompt} [y/N]: ");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        Ok(matches!(
            line.trim().to_ascii_lowercase().as_str(),
            "y" | "yes"
        ))
    }
}

/// The state transition required to make the destination usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrepareAction {
    /// The destination does not exist yet.
    CreateMissing,
    /// The destination exists and is already empty.
    AlreadyEmpty,
    /// The destination exists with contents and must be cleared first.
    ClearAndRecreate,
}

/// Whether a requested deletion became visible within the wait bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    Confirmed,
    Unconfirmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrepareReport {
    pub action: PrepareAction,
    pub clear: Option<ClearOutcome>,
}

/// Decide what has to happen to the destination, without touching it.
///
/// Clearing a non-empty destination requires either `assume_yes` or an
/// accepted prompt; a declined prompt aborts the run via
/// [`CleanError::Aborted`].
pub fn plan_destination(
    destination: &Path,
    assume_yes: bool,
    confirm: &mut dyn Confirm,
) -> Result<PrepareAction> {
    if !destination.exists() {
        return Ok(PrepareAction::CreateMissing);
    }
    if !destination.is_dir() {
        return Err(CleanError::Validation {
            field: "destination".to_string(),
            reason: format!("'{}' exists and is not a directory", destination.display()),
        });
    }
    if is_empty_dir(destination)? {
        return Ok(PrepareAction::AlreadyEmpty);
    }
    if assume_yes {
        return Ok(PrepareAction::ClearAndRecreate);
    }

    let prompt = format!(
        "The destination path ('{}') already exists! Would you like to continue? \
         This will overwrite the directory.",
        destination.display()
    );
    if confirm.confirm(&prompt)? {
        Ok(PrepareAction::ClearAndRecreate)
    } else {
        Err(CleanError::Aborted)
    }
}

/// Ensure the destination exists and is empty.
///
/// Clearing is destructive and only happens per the plan returned by
/// [`plan_destination`]. The final directory creation is idempotent and
/// tolerates an unconfirmed removal.
pub fn prepare_destination(
    destination: &Path,
    assume_yes: bool,
    confirm: &mut dyn Confirm,
    clear_timeout: Duration,
) -> Result<PrepareReport> {
    let action = plan_destination(destination, assume_yes, confirm)?;

    let clear = match action {
        PrepareAction::ClearAndRecreate => Some(clear_directory(destination, clear_timeout)?),
        PrepareAction::CreateMissing | PrepareAction::AlreadyEmpty => None,
    };

    fs::create_dir_all(destination).map_err(|e| CleanError::FileSystem {
        path: destination.to_path_buf(),
        operation: "create destination directory".to_string(),
        source: e,
    })?;

    Ok(PrepareReport { action, clear })
}

/// Recursively delete `path`, then wait up to `timeout` for the deletion to
/// become visible.
///
/// Deletion can be asynchronous at the filesystem level; an expired wait is
/// reported as [`ClearOutcome::Unconfirmed`] and processing continues.
pub fn clear_directory(path: &Path, timeout: Duration) -> Result<ClearOutcome> {
    fs::remove_dir_all(path).map_err(|e| CleanError::FileSystem {
        path: path.to_path_buf(),
        operation: "clear destination directory".to_string(),
        source: e,
    })?;

    let deadline = Instant::now() + timeout;
    while path.is_dir() {
        if Instant::now() >= deadline {
            log::warn!(
                "'{}' still visible after {:?}; continuing anyway",
                path.display(),
                timeout
            );
            return Ok(ClearOutcome::Unconfirmed);
        }
        thread::sleep(POLL_INTERVAL);
    }
    Ok(ClearOutcome::Confirmed)
}

fn is_empty_dir(path: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(path).map_err(|e| CleanError::FileSystem {
        path: path.to_path_buf(),
        operation: "read destination directory".to_string(),
        source: e,
    })?;
    Ok(entries.next().is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{ScriptedConfirm, UnreachableConfirm};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_destination_plans_creation_without_prompting() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("cleaned");

        let action = plan_destination(&dest, false, &mut UnreachableConfirm)?;
        assert_eq!(action, PrepareAction::CreateMissing);
        Ok(())
    }

    #[test]
    fn empty_destination_plans_no_changes() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();

        let action = plan_destination(temp_dir.path(), false, &mut UnreachableConfirm)?;
        assert_eq!(action, PrepareAction::AlreadyEmpty);
        Ok(())
    }

    #[test]
    fn non_empty_destination_with_assume_yes_skips_the_prompt() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("stale.png"), b"x").unwrap();

        let action = plan_destination(temp_dir.path(), true, &mut UnreachableConfirm)?;
        assert_eq!(action, PrepareAction::ClearAndRecreate);
        Ok(())
    }

    #[test]
    fn accepted_prompt_plans_clearing() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("stale.png"), b"x").unwrap();

        let mut confirm = ScriptedConfirm::new([true]);
        let action = plan_destination(temp_dir.path(), false, &mut confirm)?;
        assert_eq!(action, PrepareAction::ClearAndRecreate);
        assert_eq!(confirm.prompts_seen(), 1);
        Ok(())
    }

    #[test]
    fn declined_prompt_aborts_without_changes() {
        let temp_dir = TempDir::new().unwrap();
        let stale = temp_dir.path().join("stale.png");
        fs::write(&stale, b"x").unwrap();

        let mut confirm = ScriptedConfirm::new([false]);
        let err = plan_destination(temp_dir.path(), false, &mut confirm).unwrap_err();
        assert!(matches!(err, CleanError::Aborted));
        assert!(stale.exists());
    }

    #[test]
    fn prepare_clears_and_recreates_a_populated_destination() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("cleaned");
        fs::create_dir_all(dest.join("old")).unwrap();
        fs::write(dest.join("old/artifact.png"), b"x").unwrap();

        let report = prepare_destination(
            &dest,
            true,
            &mut UnreachableConfirm,
            Duration::from_secs(10),
        )?;
        assert_eq!(report.action, PrepareAction::ClearAndRecreate);
        assert_eq!(report.clear, Some(ClearOutcome::Confirmed));
        assert!(dest.is_dir());
        assert_eq!(fs::read_dir(&dest).unwrap().count(), 0);
        Ok(())
    }

    #[test]
    fn prepare_creates_a_missing_destination_tree() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("deep/nested/cleaned");

        let report = prepare_destination(
            &dest,
            false,
            &mut UnreachableConfirm,
            Duration::from_secs(10),
        )?;
        assert_eq!(report.action, PrepareAction::CreateMissing);
        assert_eq!(report.clear, None);
        assert!(dest.is_dir());
        Ok(())
    }
}
