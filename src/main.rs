mod args;

use args::Args;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use template_tap_bot::adb::AdbShell;
use template_tap_bot::bot::{
    BotConfig, BotController, BotHandle, BotPorts, FileTemplateLoader, IntervalScheduler,
    create_report_channel,
};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::parse() {
        Ok(Some(args)) => args,
        Ok(None) => return ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {e}");
            args::print_help();
            return ExitCode::from(2);
        }
    };

    let default_level = if args.debug_mode { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
    log::debug!("{}", args::version_line());

    if args.list_devices {
        return list_devices().await;
    }

    let adb = match AdbShell::connect(args.device.as_deref()).await {
        Ok(adb) => Arc::new(adb),
        Err(e) => {
            log::error!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };

    let config = BotConfig {
        default_interval_secs: args.interval_secs,
        default_confidence: args.confidence,
        ..BotConfig::default()
    }
    .with_capture_timeout(Duration::from_millis(args.capture_timeout_ms));

    let ports = BotPorts {
        capture: Arc::clone(&adb),
        loader: FileTemplateLoader::new(),
        action: adb,
    };
    let report_config = config.clone();
    let bot = BotController::spawn(ports, config);
    if args.once {
        let code = run_once(&bot, args.template_ref(), args.confidence).await;
        bot.shutdown();
        code
    } else {
        run_until_interrupted(&bot, &args, &report_config).await
    }
}

async fn list_devices() -> ExitCode {
    match AdbShell::list_devices().await {
        Ok(devices) if devices.is_empty() => {
            println!("❌ No devices found");
            ExitCode::FAILURE
        }
        Ok(devices) => {
            for device in devices {
                println!("📱 {}", device.label());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_once(bot: &BotHandle, template: &str, confidence: f64) -> ExitCode {
    let pending = match bot.attempt(template, confidence) {
        Ok(pending) => pending,
        Err(e) => {
            log::error!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };
    match pending.await {
        Ok(report) => {
            println!("{}", report.summary());
            if report.tapped() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            log::error!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_until_interrupted(bot: &BotHandle, args: &Args, config: &BotConfig) -> ExitCode {
    let template = args.template_ref();
    let (report_tx, mut report_rx) = create_report_channel(config);
    let scheduler = IntervalScheduler::new(bot)
        .with_reports(report_tx)
        .spawn();

    if let Err(e) = bot.start(template, args.interval_secs, args.confidence) {
        log::error!("❌ {e}");
        bot.shutdown();
        return ExitCode::FAILURE;
    }
    println!("🚀 Watching for '{template}' every {}s, Ctrl-C to stop", args.interval_secs);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let (mut attempts, mut taps) = (0u64, 0u64);
    loop {
        tokio::select! {
            signal = &mut ctrl_c => {
                if let Err(e) = signal {
                    log::warn!("Failed to listen for Ctrl-C: {e}");
                }
                break;
            }
            report = report_rx.recv() => {
                let Some(report) = report else { break };
                attempts += 1;
                if report.tapped() {
                    taps += 1;
                }
            }
        }
    }

    bot.stop();
    bot.shutdown();
    if let Err(e) = scheduler.await {
        log::warn!("Scheduler task failed: {e}");
    }
    println!("⏹️ Stopped after {attempts} attempts, {taps} taps");
    ExitCode::SUCCESS
}
