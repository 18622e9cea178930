// ADB adapter: drives an Android device through the `adb` command line
// and exposes it as the bot's capture and action ports.

pub mod error;
pub mod shell;
pub mod types;


pub use error::{AdbError, AdbResult};
pub use shell::AdbShell;
pub use types::Device;
