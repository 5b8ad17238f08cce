use crate::interface::ThreadSafe;
use crate::model::error::Error;
use crate::model::error::adapter::AdapterError;
use crate::model::process::{CommandOutput, CommandSpec};
use async_trait::async_trait;

#[async_trait]
pub trait ProcessRunner: ThreadSafe {
    /// Runs the command to completion or until its timeout expires.
    ///
    /// A non-zero exit is reported through [`CommandOutput::success`], only
    /// spawn failures and timeouts are errors.
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, Error>;

    /// Like [`run`](Self::run) but a non-zero exit is an error carrying stderr.
    async fn run_checked(&self, command: &CommandSpec) -> Result<CommandOutput, Error> {
        let output = self.run(command).await?;
        if output.success {
            return Ok(output);
        }
        let detail = match output.stderr.trim() {
            "" => match output.code {
                Some(code) => format!("exit code {code}"),
                None => "terminated by signal".to_string(),
            },
            stderr => stderr.to_string(),
        };
        Err(AdapterError::command_failed(command.program.clone(), detail).into())
    }
}
