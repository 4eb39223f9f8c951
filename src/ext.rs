use std::{
  io::Read,
  process::{Child, Command, ExitStatus, Stdio},
  time::Duration,
};

use anyhow::{Context, Result};
use wait_timeout::ChildExt as WaitExt;

#[extend::ext]
pub impl ExitStatus {
  fn check_success(&self) -> Result<()> {
    if !self.success() {
      anyhow::bail!("exited with non-zero status {self}");
    }

    Ok(())
  }
}

#[extend::ext]
pub impl Child {
  /// Returns an error if the exit status was non-zero. On timeout, the child
  /// is killed and `Ok(None)` is returned.
  fn check_success_timeout(&mut self, timeout: Duration) -> Result<Option<()>> {
    let Some(status) = self.wait_timeout(timeout).context("wait")? else {
      self.kill().context("kill after timeout")?;
      self.wait().context("reap after kill")?;

      return Ok(None);
    };

    status.check_success()?;

    Ok(Some(()))
  }
}

#[extend::ext]
pub impl Command {
  /// Runs the command, capturing only stdout, returning an error on non-zero
  /// exit, or `Ok(None)` on timeout. Only meant for commands with short
  /// output, since stdout is drained after the child exits.
  fn status_stdout_timeout(&mut self, timeout: Duration) -> Result<Option<String>> {
    let mut child = self
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::null())
      .spawn()
      .context("spawn")?;
    let mut stdout = child.stdout.take().context("stdout")?;

    if child.check_success_timeout(timeout)?.is_none() {
      return Ok(None);
    }

    let mut output = String::new();
    stdout.read_to_string(&mut output).context("read")?;

    Ok(Some(output))
  }
}

#[cfg(test)]
mod tests {
  use std::{process::Command, time::Duration};

  use super::CommandExt;

  #[cfg(unix)]
  #[test]
  fn captures_stdout() {
    let output = Command::new("sh")
      .args(["-c", "echo hello"])
      .status_stdout_timeout(Duration::from_secs(5))
      .unwrap();

    assert_eq!(output.as_deref(), Some("hello\n"));
  }

  #[cfg(unix)]
  #[test]
  fn non_zero_exit_is_an_error() {
    let result = Command::new("sh")
      .args(["-c", "exit 3"])
      .status_stdout_timeout(Duration::from_secs(5));

    assert!(result.is_err());
  }

  #[cfg(unix)]
  #[test]
  fn timeout_kills_the_child() {
    let output = Command::new("sh")
      .args(["-c", "sleep 10"])
      .status_stdout_timeout(Duration::from_millis(100))
      .unwrap();

    assert_eq!(output, None);
  }

  #[test]
  fn missing_program_is_an_error() {
    let result = Command::new("definitely-not-a-real-program-4242").status_stdout_timeout(Duration::from_secs(1));

    assert!(result.is_err());
  }
}
