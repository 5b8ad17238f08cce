#![allow(dead_code)]

use async_trait::async_trait;
use backup_sphere::interface::event_sink::EventSink;
use backup_sphere::interface::process_runner::ProcessRunner;
use backup_sphere::model::error::Error;
use backup_sphere::model::event::{BackupEvent, BackupEventKind};
use backup_sphere::model::process::{CommandOutput, CommandSpec};
use std::sync::Mutex;

/// Keeps every event it is notified of.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<BackupEvent>>,
}

impl RecordingSink {
    pub fn kinds(&self) -> Vec<BackupEventKind> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|event| event.kind)
            .collect()
    }

    pub fn last(&self) -> Option<BackupEvent> {
        self.events.lock().unwrap().last().cloned()
    }
}

impl EventSink for RecordingSink {
    fn notify(&self, event: BackupEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Stands in for the database dump tools: records each command and writes
/// a small dump wherever the command would have written one.
#[derive(Default)]
pub struct ScriptedRunner {
    commands: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub fn programs(&self) -> Vec<String> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .map(|command| command.program.clone())
            .collect()
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, Error> {
        self.commands.lock().unwrap().push(command.clone());
        let file_flag = command
            .args
            .iter()
            .position(|arg| arg == "--file")
            .and_then(|index| command.args.get(index + 1));
        let result_file = command
            .args
            .iter()
            .find_map(|arg| arg.strip_prefix("--result-file="));
        let target = file_flag
            .map(String::as_str)
            .or(result_file)
            .map(std::path::PathBuf::from)
            .or_else(|| command.stdout.clone());
        if let Some(target) = target {
            std::fs::write(target, "-- scripted dump\n").unwrap();
        }
        Ok(CommandOutput {
            success: true,
            code: Some(0),
            ..CommandOutput::default()
        })
    }
}
