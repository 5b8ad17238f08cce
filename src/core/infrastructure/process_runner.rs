use crate::interface::process_runner::ProcessRunner;
use crate::model::error::Error;
use crate::model::error::adapter::AdapterError;
use crate::model::error::io::IOError;
use crate::model::process::{CommandOutput, CommandSpec};
use async_trait::async_trait;
use std::fs::File;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::timeout;

/// Runs commands as real child processes, killed when their timeout expires.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioProcessRunner;

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, Error> {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .envs(spec.env.iter().map(|(key, value)| (key, value)))
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match &spec.stdin {
            Some(path) => {
                let file = File::open(path).map_err(|err| IOError::read_file_failed(path, err))?;
                command.stdin(Stdio::from(file));
            }
            None => {
                command.stdin(Stdio::null());
            }
        }
        match &spec.stdout {
            Some(path) => {
                let file =
                    File::create(path).map_err(|err| IOError::create_file_failed(path, err))?;
                command.stdout(Stdio::from(file));
            }
            None => {
                command.stdout(Stdio::piped());
            }
        }

        let child = command
            .spawn()
            .map_err(|err| AdapterError::spawn_failed(spec.program.clone(), err))?;

        let output = match timeout(spec.timeout, child.wait_with_output()).await {
            Ok(output) => output.map_err(|err| AdapterError::command_failed(spec.program.clone(), err))?,
            Err(_) => Err(AdapterError::command_timed_out(
                spec.program.clone(),
                spec.timeout.as_secs(),
            ))?,
        };

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    #[tokio::test]
    async fn captures_exit_status_and_output() {
        let runner = TokioProcessRunner;
        let spec = CommandSpec::new("sh").args(["-c", "echo out; echo err >&2; exit 3"]);

        let output = runner.run(&spec).await.unwrap();

        assert!(!output.success);
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
        assert!(runner.run_checked(&spec).await.is_err());
    }

    #[tokio::test]
    async fn redirects_files_and_passes_env() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("out.txt");
        std::fs::write(&input, "payload\n").unwrap();
        let spec = CommandSpec::new("sh")
            .args(["-c", "cat; printf '%s' \"$SECRET\""])
            .env("SECRET", "hunter2")
            .stdin(&input)
            .stdout(&output);

        TokioProcessRunner.run_checked(&spec).await.unwrap();

        assert_eq!(std::fs::read_to_string(&output).unwrap(), "payload\nhunter2");
    }

    #[tokio::test]
    async fn timeout_kills_the_child() {
        let spec = CommandSpec::new("sleep")
            .arg("30")
            .timeout(Duration::from_millis(100));
        let started = Instant::now();

        let result = TokioProcessRunner.run(&spec).await;

        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_failure() {
        let spec = CommandSpec::new("definitely-not-a-real-binary-4f1c");
        assert!(TokioProcessRunner.run(&spec).await.is_err());
    }
}
