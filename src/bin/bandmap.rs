// Bandmap CLI
// Runs the translation service for Rock Band 4 Bluetooth instruments

use std::os::unix::net::UnixStream;
use std::process::ExitCode;

use anyhow::Context;
use bandmap_core::event::EventLoop;
use bandmap_core::EventLoopError;
use clap::Parser;

/// Rock Band 4 Bluetooth instrument mapper
#[derive(Parser, Debug)]
#[command(name = "bandmap")]
#[command(version)]
#[command(about = "Maps Rock Band 4 Bluetooth instruments to a standard virtual gamepad", long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// List supported peripherals and exit
    #[arg(long)]
    list_devices: bool,
}

/// Default filter is `info`, or `debug` with --verbose; RUST_LOG wins.
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

/// Route SIGINT/SIGTERM into a socket the event loop polls.
fn shutdown_pipe() -> anyhow::Result<UnixStream> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::low_level::pipe;

    let (reader, writer) = UnixStream::pair().context("Failed to create shutdown pipe")?;
    writer.set_nonblocking(true)?;
    for signal in [SIGINT, SIGTERM] {
        pipe::register(signal, writer.try_clone()?)
            .with_context(|| format!("Failed to register handler for signal {}", signal))?;
    }
    Ok(reader)
}

fn list_devices() -> anyhow::Result<()> {
    let devices = EventLoop::list_devices()?;
    if devices.is_empty() {
        println!("No supported peripherals found");
        return Ok(());
    }
    println!("Found {} node(s):", devices.len());
    for device in &devices {
        println!(
            "  {} [{}] {} ({:?})",
            device.path.display(),
            device.kind,
            device.name,
            device.class
        );
    }
    Ok(())
}

fn run() -> anyhow::Result<()> {
    let shutdown = shutdown_pipe()?;
    let mut event_loop = EventLoop::start(Some(shutdown))?;
    event_loop.run()?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);
    log::debug!("bandmap {} starting", env!("CARGO_PKG_VERSION"));

    let result = if args.list_devices {
        list_devices()
    } else {
        run()
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let privilege_failure = e
                .downcast_ref::<EventLoopError>()
                .is_some_and(EventLoopError::is_privilege_failure);
            if privilege_failure {
                eprintln!("Permission error, try running as root.");
            }
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["bandmap"]);
        assert!(!args.verbose);
        assert!(!args.list_devices);
    }

    #[test]
    fn test_args_with_options() {
        let args = Args::parse_from(["bandmap", "-v", "--list-devices"]);
        assert!(args.verbose);
        assert!(args.list_devices);
    }

    #[test]
    fn test_args_reject_unknown_flag() {
        assert!(Args::try_parse_from(["bandmap", "--config", "x.toml"]).is_err());
    }
}
