pub mod adb;
pub mod bot;
pub mod template_matching;

pub use bot::{BotConfig, BotController, BotHandle, BotPorts, IntervalScheduler};
pub use template_matching::{Image, MatchResult, TemplateMatcher};
