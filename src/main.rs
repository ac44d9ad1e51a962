use std::{error::Error, process};

use clap::Parser;
use eframe::{egui::ViewportBuilder, run_native};
use roosty_alarm::{
    audio::{AlarmAudio, Ringtone},
    cli::{Args, Command},
    config::{Config, ConfigError, Settings},
    outcome::Outcome,
    watchdog, AlarmApp,
};

fn load_config(args: &Args) -> Result<Config, ConfigError> {
    match &args.config {
        Some(path) => Config::load(path),
        None => match Config::config_path() {
            Ok(path) => Config::load_or_default(&path),
            Err(e) => {
                log::warn!("{e}, using defaults");
                Ok(Config::default())
            }
        },
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    // initilize the logger
    if simple_file_logger::init_logger!("roosty_alarm").is_err() {
        eprintln!("couldn't initialize logger, continuing without a log file");
    }

    let args = Args::parse();
    if let Some(Command::Init { force }) = args.command {
        let path = match &args.config {
            Some(path) => path.clone(),
            None => Config::config_path()?,
        };
        if Config::init(&path, force)? {
            println!("wrote default config to {}", path.display());
        } else {
            println!("{} already exists, use --force to overwrite it", path.display());
        }
        return Ok(());
    }

    let settings = Settings::resolve(&args, load_config(&args)?);
    log::info!("starting with {settings:?}");

    watchdog::spawn(settings.timeout, || {
        let outcome = Outcome::TimedOut;
        println!("{outcome}");
        log::info!("{outcome}, exiting with {}", outcome.exit_code());
        process::exit(outcome.exit_code());
    });

    // the alarm still shows without sound
    let audio = match AlarmAudio::play(&Ringtone::from_setting(settings.ringtone.as_deref())) {
        Ok(audio) => Some(audio),
        Err(e) => {
            eprintln!("Audio error: {e}");
            log::error!("audio disabled: {e}");
            None
        }
    };

    let native_options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_title("Alarm")
            .with_fullscreen(true),
        ..Default::default()
    };
    run_native(
        "Alarm",
        native_options,
        Box::new(move |cc| Ok(Box::new(AlarmApp::new(cc, &settings, audio)))),
    )
    .map_err(std::convert::Into::into)
}
