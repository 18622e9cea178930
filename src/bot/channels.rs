// Communication channels for the bot loop
use super::config::BotConfig;
use super::types::{AttemptReport, Session, WorkerCommand};
use tokio::sync::{mpsc, watch};

/// Command queue feeding the worker, sized from the config
pub fn create_command_channel(
    config: &BotConfig,
) -> (mpsc::Sender<WorkerCommand>, mpsc::Receiver<WorkerCommand>) {
    mpsc::channel(config.command_buffer.max(1))
}

/// Session state, starting idle
pub fn create_session_channel() -> (watch::Sender<Session>, watch::Receiver<Session>) {
    watch::channel(Session::default())
}

/// Stream of reports for whoever wants to observe scheduled attempts
pub fn create_report_channel(
    config: &BotConfig,
) -> (mpsc::Sender<AttemptReport>, mpsc::Receiver<AttemptReport>) {
    mpsc::channel(config.report_buffer.max(1))
}
