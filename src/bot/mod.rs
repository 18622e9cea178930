// Bot loop: a serial worker that captures, searches and taps, plus the handle
// and scheduler that drive it.

pub mod channels;
pub mod config;
pub mod controller;
pub mod error;
pub mod ports;
pub mod scheduler;
pub mod types;


pub use channels::create_report_channel;
pub use config::{BotConfig, DEFAULT_CAPTURE_TIMEOUT};
pub use controller::{BotController, BotHandle, PendingAttempt, WeakBotHandle};
pub use error::{AttemptError, BotError, BotResult, PortError};
pub use ports::{ActionPort, BotPorts, CapturePort, FileTemplateLoader, TemplateLoader};
pub use scheduler::IntervalScheduler;
pub use types::{AttemptOutcome, AttemptReport, BotState, RunConfig, Session};
