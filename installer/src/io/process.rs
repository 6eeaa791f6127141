//! Helpers for running child processes while mirroring their output.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;

use tracing::{debug, instrument, warn};

/// Exit status and combined stdout/stderr of a finished child.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub combined: String,
}

/// Which of the parent's streams a child stream is mirrored to.
#[derive(Debug, Clone, Copy)]
enum Mirror {
    Stdout,
    Stderr,
    Silent,
}

type SharedBuffer = Arc<Mutex<Vec<u8>>>;

/// Spawn `cmd` with stdin closed and both output streams piped.
pub fn spawn_piped(cmd: &mut Command) -> io::Result<Child> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    debug!("spawning child process");
    cmd.spawn()
}

/// Drain a piped child until it exits.
///
/// Each line is written to the matching parent stream as soon as it arrives
/// (when `mirror` is set) and appended to one combined buffer, so the caller
/// sees live output and can still scan all of it afterwards.
#[instrument(skip_all, fields(pid = child.id(), mirror = mirror))]
pub fn wait_with_tee(mut child: Child, mirror: bool) -> io::Result<CommandOutput> {
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::other("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| io::Error::other("stderr was not piped"))?;

    let combined: SharedBuffer = Arc::new(Mutex::new(Vec::new()));
    let (out_mirror, err_mirror) = if mirror {
        (Mirror::Stdout, Mirror::Stderr)
    } else {
        (Mirror::Silent, Mirror::Silent)
    };

    let stdout_buf = Arc::clone(&combined);
    let stdout_handle = thread::spawn(move || tee_lines(stdout, out_mirror, &stdout_buf));
    let stderr_buf = Arc::clone(&combined);
    let stderr_handle = thread::spawn(move || tee_lines(stderr, err_mirror, &stderr_buf));

    let status = child.wait()?;
    join_reader(stdout_handle)?;
    join_reader(stderr_handle)?;

    let bytes = match Arc::try_unwrap(combined) {
        Ok(mutex) => mutex.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner()),
        Err(shared) => shared
            .lock()
            .map(|buf| buf.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone()),
    };

    debug!(exit_code = ?status.code(), bytes = bytes.len(), "command finished");
    Ok(CommandOutput {
        status,
        combined: String::from_utf8_lossy(&bytes).into_owned(),
    })
}

fn join_reader(handle: thread::JoinHandle<io::Result<()>>) -> io::Result<()> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(io::Error::other("output reader thread panicked")),
    }
}

fn tee_lines<R: Read>(reader: R, mirror: Mirror, combined: &SharedBuffer) -> io::Result<()> {
    let mut reader = BufReader::new(reader);
    loop {
        let mut line = Vec::new();
        let n = reader.read_until(b'\n', &mut line)?;
        if n == 0 {
            break;
        }

        let written = match mirror {
            Mirror::Stdout => write_flush(io::stdout().lock(), &line),
            Mirror::Stderr => write_flush(io::stderr().lock(), &line),
            Mirror::Silent => Ok(()),
        };
        if let Err(err) = written {
            warn!(err = %err, "failed to mirror child output");
        }

        // An unterminated last line must not run into the other stream's next line.
        if line.last() != Some(&b'\n') {
            line.push(b'\n');
        }
        match combined.lock() {
            Ok(mut buf) => buf.extend_from_slice(&line),
            Err(poisoned) => poisoned.into_inner().extend_from_slice(&line),
        }
    }
    Ok(())
}

fn write_flush<W: Write>(mut writer: W, line: &[u8]) -> io::Result<()> {
    writer.write_all(line)?;
    writer.flush()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn collects_both_streams() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo out; echo err 1>&2; printf tail");
        let child = spawn_piped(&mut cmd).expect("spawn");
        let output = wait_with_tee(child, false).expect("wait");
        assert!(output.status.success());
        assert!(output.combined.contains("out\n"));
        assert!(output.combined.contains("err\n"));
        assert!(output.combined.contains("tail\n"));
    }

    #[test]
    fn unterminated_line_stays_separate_from_other_stream() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg("printf '[!] Error installing boost'; sleep 0.2; echo 'curl: (6) Could not resolve host' 1>&2");
        let child = spawn_piped(&mut cmd).expect("spawn");
        let output = wait_with_tee(child, false).expect("wait");
        let lines: Vec<&str> = output.combined.lines().collect();
        assert!(lines.contains(&"[!] Error installing boost"));
        assert!(lines.contains(&"curl: (6) Could not resolve host"));
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn reports_non_zero_exit() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo '[!] boom'; exit 3");
        let child = spawn_piped(&mut cmd).expect("spawn");
        let output = wait_with_tee(child, false).expect("wait");
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(output.combined, "[!] boom\n");
    }
}
