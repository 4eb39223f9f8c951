use std::{fs, process::Command, time::Duration};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::ext::CommandExt;

/// Substituted for any piece of environment metadata that could not be
/// determined.
pub const UNKNOWN: &str = "unknown";

/// Description of the machine the benchmarks ran on, as printed in the report
/// header. Every field is plain text; failed probes are already replaced by
/// [`UNKNOWN`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Environment {
  /// Name of the toolchain driver, e.g. `zig`.
  pub toolchain: String,
  pub toolchain_version: String,
  /// Version line of the C compiler bundled with the toolchain.
  pub cc_version: String,
  pub kernel: String,
  pub cpu: String,
  /// Local date of the report, `YYYY-MM-DD`.
  pub date: String,
}

impl Environment {
  /// Probes the current machine. Never fails: each probe that errors or times
  /// out is logged and reported as [`UNKNOWN`].
  pub fn probe(toolchain: &str, timeout: Duration) -> Self {
    Self {
      toolchain: toolchain.to_string(),
      toolchain_version: or_unknown("toolchain version", toolchain_version(toolchain, timeout)),
      cc_version: or_unknown("cc version", cc_version(toolchain, timeout)),
      kernel: or_unknown("kernel", kernel(timeout)),
      cpu: or_unknown("cpu model", cpu_model(timeout)),
      date: chrono::Local::now().format("%Y-%m-%d").to_string(),
    }
  }
}

fn or_unknown(what: &str, probed: Result<String>) -> String {
  match probed {
    Ok(value) if !value.is_empty() => value,
    Ok(_) => {
      warn!("{what}: empty, using {UNKNOWN:?}");
      UNKNOWN.to_string()
    }
    Err(err) => {
      warn!("{what}: {err:#}, using {UNKNOWN:?}");
      UNKNOWN.to_string()
    }
  }
}

/// Runs `program args..`, returning its trimmed stdout.
fn probe_stdout(program: &str, args: &[&str], timeout: Duration) -> Result<String> {
  debug!("probing `{program} {}`", args.join(" "));

  let Some(stdout) = Command::new(program)
    .args(args)
    .status_stdout_timeout(timeout)
    .with_context(|| format!("{program} {args:?}"))?
  else {
    anyhow::bail!("{program} {args:?} timed out after {timeout:?}");
  };

  Ok(stdout.trim().to_string())
}

fn toolchain_version(toolchain: &str, timeout: Duration) -> Result<String> {
  probe_stdout(toolchain, &["version"], timeout)
}

fn cc_version(toolchain: &str, timeout: Duration) -> Result<String> {
  let output = probe_stdout(toolchain, &["cc", "--version"], timeout)?;

  Ok(first_version_line(&output).to_string())
}

/// First line of a `cc --version` banner, without the parenthesized build
/// details, e.g. `clang version 19.1.7` out of
/// `clang version 19.1.7 (https://github.com/ziglang/zig-bootstrap ...)`.
fn first_version_line(output: &str) -> &str {
  let line = output.lines().next().unwrap_or_default();

  line.split(" (").next().unwrap_or(line).trim()
}

fn kernel(timeout: Duration) -> Result<String> {
  if cfg!(target_os = "linux") {
    let read = |name: &str| -> Result<String> {
      let path = format!("/proc/sys/kernel/{name}");
      let value = fs::read_to_string(&path).with_context(|| format!("read {path}"))?;

      Ok(value.trim().to_string())
    };

    Ok(format_kernel(&read("ostype")?, &read("osrelease")?, &read("version")?))
  } else {
    let uname = probe_stdout("uname", &["-srv"], timeout)?;

    split_uname(&uname).context("malformed `uname -srv` output")
  }
}

/// Splits `uname -srv` output. The system name and release are single words,
/// the version is the rest of the line.
fn split_uname(uname: &str) -> Option<String> {
  let (system, rest) = uname.trim().split_once(' ')?;
  let (release, version) = rest.split_once(' ')?;

  Some(format_kernel(system, release, version.trim()))
}

fn format_kernel(system: &str, release: &str, version: &str) -> String {
  format!("{system} {release} ({version})")
}

fn cpu_model(timeout: Duration) -> Result<String> {
  if cfg!(target_os = "linux") {
    let cpuinfo = fs::read_to_string("/proc/cpuinfo").context("read /proc/cpuinfo")?;

    model_name(&cpuinfo).context("no model name in /proc/cpuinfo")
  } else if cfg!(target_os = "macos") {
    probe_stdout("sysctl", &["-n", "machdep.cpu.brand_string"], timeout)
  } else if cfg!(windows) {
    std::env::var("PROCESSOR_IDENTIFIER").context("PROCESSOR_IDENTIFIER")
  } else {
    anyhow::bail!("unsupported platform {}", std::env::consts::OS)
  }
}

/// Value of the first `model name` line of `/proc/cpuinfo`.
fn model_name(cpuinfo: &str) -> Option<String> {
  cpuinfo
    .lines()
    .find(|line| line.to_lowercase().starts_with("model name"))
    .and_then(|line| line.split_once(':'))
    .map(|(_, model)| model.trim().to_string())
}
