mod config;
mod detector;
mod dispatch;
mod fingerprint;
mod session;
#[cfg(test)]
mod testing;
mod trace;
mod web;

use clap::{Parser, Subcommand};
use std::fs;
use std::process::ExitCode;
use std::sync::Arc;

use crate::config::Config;
use crate::dispatch::{
    Alert, AlertDispatcher, BackendClient, LogFeedback, PatientRegistration, StatusBoard,
};
use crate::session::{Session, SessionEvent};
use crate::trace::Trace;

#[derive(Parser)]
#[command(name = "fall-o-mat")]
#[command(about = "Wearable fall detection and Wi-Fi fingerprint relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the ingest API
    Serve { config: String },
    /// Replay a recorded sensor trace through a fresh session
    Replay {
        config: String,
        trace: String,
        /// Deliver the produced events to the backend
        #[arg(long)]
        dispatch: bool,
    },
    /// Validate a sensor trace file
    Validate { trace: String },
    /// Register a patient with the backend
    Register {
        config: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        birth: String,
        /// Defaults to the configured device identifier
        #[arg(long)]
        identifier: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => serve(&config).await,
        Commands::Replay {
            config,
            trace,
            dispatch,
        } => replay(&config, &trace, dispatch).await,
        Commands::Validate { trace } => validate(&trace),
        Commands::Register {
            config,
            name,
            birth,
            identifier,
        } => register(&config, name, birth, identifier).await,
    }
}

fn load_config(path: &str) -> Option<Config> {
    match Config::from_file(path) {
        Ok(c) => Some(c),
        Err(e) => {
            eprintln!("Config error: {}", e);
            None
        }
    }
}

fn load_trace(path: &str) -> Option<Trace> {
    let yaml = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            return None;
        }
    };

    match Trace::from_str(&yaml) {
        Ok(t) => Some(t),
        Err(e) => {
            eprintln!("Parse error: {}", e);
            None
        }
    }
}

fn dispatcher(config: &Config) -> Option<AlertDispatcher> {
    match BackendClient::new(&config.backend) {
        Ok(client) => Some(AlertDispatcher::new(
            client,
            StatusBoard::new(),
            Arc::new(LogFeedback),
        )),
        Err(e) => {
            eprintln!("Backend client error: {}", e);
            None
        }
    }
}

async fn serve(path: &str) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };

    match web::run_server(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn validate(path: &str) -> ExitCode {
    let Some(trace) = load_trace(path) else {
        return ExitCode::FAILURE;
    };

    println!("Trace is valid ({} records)", trace.records.len());
    for name in ["accelerometer", "gyroscope", "scan"] {
        println!("  {}: {}", name, trace.count(name));
    }
    if let Some(last) = trace.records.iter().map(|r| r.at).max() {
        println!("  span: {} ms", last.num_milliseconds());
    }
    ExitCode::SUCCESS
}

async fn replay(config_path: &str, trace_path: &str, dispatch: bool) -> ExitCode {
    let Some(config) = load_config(config_path) else {
        return ExitCode::FAILURE;
    };
    let Some(trace) = load_trace(trace_path) else {
        return ExitCode::FAILURE;
    };
    let dispatcher = if dispatch {
        match dispatcher(&config) {
            Some(d) => Some(d),
            None => return ExitCode::FAILURE,
        }
    } else {
        None
    };

    let mut session = Session::new(
        config.device.identifier.clone(),
        config.detection.clone(),
        &config.fingerprint,
        trace.start,
    );
    println!("Replaying {} records from {}", trace.records.len(), trace.start);

    let events = session.replay(trace.inputs());
    let mut failures = 0;
    for event in events {
        match &event {
            SessionEvent::Fall(fall) => println!(
                "  {} fall (magnitude {:.2}, angular delta {:.2})",
                fall.detected_at, fall.magnitude, fall.angular_delta
            ),
            SessionEvent::Fingerprint(batch) => println!(
                "  {} fingerprint batch of {} snapshots",
                batch.captured_at,
                batch.snapshots().len()
            ),
        }

        if let Some(dispatcher) = &dispatcher {
            let alert = Alert::from_session_event(&session.info().identifier, event);
            let status = dispatcher.deliver(alert).await;
            if !status.success {
                failures += 1;
                println!(
                    "    delivery failed: {}",
                    status.error_code.as_deref().unwrap_or("unknown")
                );
            }
        }
    }

    let counters = session.counters();
    println!(
        "Replay completed: {} falls, {} batches, {} scans ignored",
        counters.falls, counters.batches, counters.ignored_scans
    );

    if failures > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

async fn register(
    path: &str,
    name: String,
    birth: String,
    identifier: Option<String>,
) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };
    let Some(dispatcher) = dispatcher(&config) else {
        return ExitCode::FAILURE;
    };

    let registration = PatientRegistration {
        name,
        birth,
        ssid: identifier.unwrap_or_else(|| config.device.identifier.clone()),
    };
    let status = dispatcher.register(&registration).await;
    if status.success {
        println!("Registered {} as {}", registration.name, registration.ssid);
        ExitCode::SUCCESS
    } else {
        eprintln!(
            "Registration failed: {} {}",
            status.error_code.as_deref().unwrap_or("unknown"),
            status.error_message.as_deref().unwrap_or("")
        );
        ExitCode::FAILURE
    }
}
