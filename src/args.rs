use template_tap_bot::BotConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    pub template: Option<String>,
    pub device: Option<String>,
    pub interval_secs: u64,
    pub confidence: f64,
    pub capture_timeout_ms: u64,
    pub once: bool,
    pub list_devices: bool,
    pub debug_mode: bool,
}

impl Args {
    /// Parse the process arguments. `Ok(None)` means help or version was printed.
    pub fn parse() -> Result<Option<Self>, String> {
        Self::parse_from(std::env::args().skip(1))
    }

    pub fn parse_from<I, S>(args: I) -> Result<Option<Self>, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let defaults = BotConfig::default();
        let mut parsed = Args {
            template: None,
            device: None,
            interval_secs: defaults.default_interval_secs,
            confidence: defaults.default_confidence,
            capture_timeout_ms: defaults.capture_timeout.as_millis() as u64,
            once: false,
            list_devices: false,
            debug_mode: false,
        };

        for arg in args {
            let arg = arg.as_ref();
            if arg == "--help" || arg == "-h" {
                print_help();
                return Ok(None);
            } else if arg == "--version" || arg == "-v" {
                println!("{}", version_line());
                return Ok(None);
            } else if arg == "--debug" {
                parsed.debug_mode = true;
            } else if arg == "--once" {
                parsed.once = true;
            } else if arg == "--devices" {
                parsed.list_devices = true;
            } else if let Some(val) = arg.strip_prefix("--template=") {
                if val.trim().is_empty() {
                    return Err("--template needs a path".to_string());
                }
                parsed.template = Some(val.to_string());
            } else if let Some(val) = arg.strip_prefix("--device=") {
                parsed.device = Some(val.to_string());
            } else if let Some(val) = arg.strip_prefix("--interval=") {
                parsed.interval_secs = match val.parse::<u64>() {
                    Ok(secs) if secs >= 1 => secs,
                    _ => return Err(format!("Invalid interval value: {val}")),
                };
            } else if let Some(val) = arg.strip_prefix("--confidence=") {
                parsed.confidence = match val.parse::<f64>() {
                    Ok(c) if (0.0..=1.0).contains(&c) => c,
                    _ => return Err(format!("Invalid confidence value: {val}")),
                };
            } else if let Some(val) = arg.strip_prefix("--capture-timeout-ms=") {
                parsed.capture_timeout_ms = match val.parse::<u64>() {
                    Ok(ms) if ms >= 1 => ms,
                    _ => return Err(format!("Invalid capture timeout value: {val}")),
                };
            } else {
                return Err(format!("Unknown argument: {arg}"));
            }
        }

        if parsed.template.is_none() && !parsed.list_devices {
            return Err("Missing required --template=PATH".to_string());
        }
        Ok(Some(parsed))
    }

    /// Template reference to search for; empty only in `--devices` mode
    pub fn template_ref(&self) -> &str {
        self.template.as_deref().unwrap_or_default()
    }
}

pub fn version_line() -> String {
    format!(
        "Template Tap Bot {} (built {})",
        env!("BOT_VERSION_DISPLAY"),
        env!("BOT_BUILD_YEAR")
    )
}

pub fn print_help() {
    println!("🤖 Template Tap Bot");
    println!();
    println!("Finds a template image on an Android screen and taps its center.");
    println!();
    println!("USAGE:");
    println!("    template-tap-bot --template=PATH [FLAGS]");
    println!();
    println!("FLAGS:");
    println!("    --template=PATH          Template image (path or file:// URI)");
    println!("    --device=SERIAL          ADB serial or transport id (default: first device)");
    println!("    --interval=N             Seconds between attempts (default: 120)");
    println!("    --confidence=F           Minimum correlation in [0, 1] (default: 0.8)");
    println!("    --capture-timeout-ms=N   Screenshot time limit (default: 3000)");
    println!("    --once                   Run a single attempt and exit (0 = tapped)");
    println!("    --devices                List connected devices and exit");
    println!("    --debug                  Enable debug logging");
    println!("    --help, -h               Show this help message");
    println!("    --version, -v            Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    template-tap-bot --template=button.png --once");
    println!("    template-tap-bot --template=button.png --interval=60 --confidence=0.9");
    println!("    template-tap-bot --devices");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Option<Args>, String> {
        Args::parse_from(args.iter().copied())
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["--template=btn.png"]).unwrap().unwrap();
        assert_eq!(args.template.as_deref(), Some("btn.png"));
        assert_eq!(args.template_ref(), "btn.png");
        assert_eq!(args.interval_secs, 120);
        assert_eq!(args.confidence, 0.8);
        assert_eq!(args.capture_timeout_ms, 3000);
        assert!(!args.once);
        assert!(!args.debug_mode);
        assert_eq!(args.device, None);
    }

    #[test]
    fn test_all_flags() {
        let args = parse(&[
            "--template=file:///tmp/btn.png",
            "--device=emulator-5554",
            "--interval=30",
            "--confidence=0.95",
            "--capture-timeout-ms=1500",
            "--once",
            "--debug",
        ])
        .unwrap()
        .unwrap();
        assert_eq!(args.device.as_deref(), Some("emulator-5554"));
        assert_eq!(args.interval_secs, 30);
        assert_eq!(args.confidence, 0.95);
        assert_eq!(args.capture_timeout_ms, 1500);
        assert!(args.once);
        assert!(args.debug_mode);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(parse(&["--template=a.png", "--interval=0"]).is_err());
        assert!(parse(&["--template=a.png", "--interval=soon"]).is_err());
        assert!(parse(&["--template=a.png", "--confidence=1.2"]).is_err());
        assert!(parse(&["--template=a.png", "--capture-timeout-ms=0"]).is_err());
        assert!(parse(&["--template="]).is_err());
        assert!(parse(&["--template=a.png", "--bogus"]).is_err());
    }

    #[test]
    fn test_template_required_unless_listing() {
        assert!(parse(&[]).is_err());
        let args = parse(&["--devices"]).unwrap().unwrap();
        assert!(args.list_devices);
        assert_eq!(args.template, None);
        assert_eq!(args.template_ref(), "");
    }

    #[test]
    fn test_template_ref_borrows_args() {
        let args = parse(&["--template=btn.png", "--interval=5"]).unwrap().unwrap();
        let template = args.template_ref();
        // Args stays usable alongside the borrowed reference
        assert_eq!((template, args.interval_secs), ("btn.png", 5));
    }

    #[test]
    fn test_version_line_includes_build_year() {
        let line = version_line();
        assert!(line.contains(env!("BOT_VERSION_DISPLAY")));
        assert!(line.contains(env!("BOT_BUILD_YEAR")));
    }
}
