use clap::Parser;
use log::error;
use macspoof::address::{self, MacAddress};
use macspoof::cli::{Args, Config};
use macspoof::ledger::ChangeLedger;
use macspoof::platform::{create_adapter, PlatformKind, SystemCommandRunner};
use macspoof::prompt;
use macspoof::session::Spoofer;
use macspoof::{Result, SpoofError};
use std::io::{self, IsTerminal};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(e.exit_code());
        }
    };

    env_logger::Builder::new()
        .filter_level(config.log_level.parse().unwrap_or(log::LevelFilter::Info))
        .init();

    match run(&args, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(SpoofError::Cancelled) => {
            println!("Operation cancelled");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            if let SpoofError::PlatformApplyFailed { .. } = e {
                if cfg!(windows) {
                    eprintln!("On Windows, try running as Administrator");
                } else {
                    eprintln!("Make sure you have sudo privileges");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(args: &Args, config: &Config) -> Result<()> {
    let kind = config.platform.resolve()?;
    let use_sudo = kind != PlatformKind::Windows && config.elevation.use_sudo();
    let adapter = create_adapter(kind, Box::new(SystemCommandRunner::new()), use_sudo);
    let ledger = ChangeLedger::open(&config.ledger.path);
    let mut spoofer = Spoofer::new(adapter, ledger).with_restore_from_history(config.restore_from_history);

    if args.history {
        return show_history(&spoofer);
    }
    if args.status {
        return show_status(&spoofer);
    }
    if args.list {
        println!("Available network interfaces:");
        for (name, mac) in spoofer.interfaces() {
            println!("  {}: {}", name, display_mac(mac));
        }
        return Ok(());
    }
    if let Some(interface) = &args.restore {
        let outcome = spoofer.restore(interface)?;
        println!("Restored {} to {}", outcome.interface, outcome.applied);
        return Ok(());
    }

    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    let interface = match &args.interface {
        Some(interface) => interface.clone(),
        None if args.yes => {
            return Err(SpoofError::Config("--interface is required with --yes".to_string()))
        }
        None => {
            let choices = spoofer.interfaces();
            prompt::select_interface(&mut stdin.lock(), &mut io::stdout(), &choices)?.to_string()
        }
    };

    let new_mac = match (&args.mac, args.random) {
        (Some(text), false) => address::normalize(text)?,
        _ => {
            let mac = address::generate();
            if !args.yes {
                println!("Generated safe MAC: {}", mac);
            }
            mac
        }
    };

    if !args.yes && interactive {
        println!("\nAbout to spoof {} to {}", interface, new_mac);
        if !prompt::confirm(&mut stdin.lock(), &mut io::stdout(), "Continue?")? {
            return Err(SpoofError::Cancelled);
        }
    }

    let outcome = spoofer.spoof(&interface, Some(&new_mac.to_string()))?;
    println!(
        "Spoofed {}: {} -> {}",
        outcome.interface,
        display_mac(outcome.previous),
        outcome.applied
    );
    if !args.yes {
        println!("Tip: use --restore {} to revert", outcome.interface);
    }
    Ok(())
}

fn show_status(spoofer: &Spoofer) -> Result<()> {
    println!("\nSystem: {} ({})", spoofer.platform(), std::env::consts::ARCH);
    println!("Network Interfaces:");
    println!("{}", "-".repeat(50));

    let rows = spoofer.status()?;
    if rows.is_empty() {
        println!("No network interfaces found");
        return Ok(());
    }
    for row in rows {
        println!("Interface: {}", row.interface);
        println!("  Current MAC: {}", display_mac(row.current));
        println!(
            "  Original MAC: {}",
            row.original.map(|m| m.to_string()).unwrap_or_else(|| "Unknown".to_string())
        );
        println!("  Spoofed: {}", if row.spoofed { "Yes" } else { "No" });
        println!();
    }
    Ok(())
}

fn show_history(spoofer: &Spoofer) -> Result<()> {
    let history = spoofer.history()?;
    if history.is_empty() {
        println!("No changes recorded in {}", spoofer.ledger().path().display());
        return Ok(());
    }
    for record in &history {
        println!(
            "{}  {:<8} {:<7} {:<12} {} -> {}",
            record.timestamp(),
            record.system(),
            record.action(),
            record.interface(),
            display_mac(record.original_mac()),
            record.new_mac()
        );
    }
    Ok(())
}

fn display_mac(mac: Option<MacAddress>) -> String {
    mac.map(|m| m.to_string()).unwrap_or_else(|| "N/A".to_string())
}
