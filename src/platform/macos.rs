use log::warn;

use super::command::run_sequence;
use super::interface::{InterfaceName, PlatformAdapter};
use super::{CommandLine, CommandRunner, PlatformKind};
use crate::address::{self, MacAddress};
use crate::error::{Result, SpoofError};

pub struct MacOsAdapter {
    runner: Box<dyn CommandRunner>,
    sudo: bool,
}

impl MacOsAdapter {
    pub fn new(runner: Box<dyn CommandRunner>, sudo: bool) -> Self {
        Self { runner, sudo }
    }
}

impl PlatformAdapter for MacOsAdapter {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Darwin
    }

    fn list_interfaces(&self) -> Vec<InterfaceName> {
        let command = CommandLine::new("networksetup", &["-listallhardwareports"]);
        match command.run(self.runner.as_ref()) {
            Ok(output) if output.success => parse_hardware_ports(&output.stdout),
            Ok(output) => {
                warn!("networksetup failed: {}", output.diagnostic());
                Vec::new()
            }
            Err(e) => {
                warn!("{}", e);
                Vec::new()
            }
        }
    }

    fn read_current_address(&self, name: &InterfaceName) -> Option<MacAddress> {
        let output = CommandLine::new("ifconfig", &[name.as_str()])
            .run(self.runner.as_ref())
            .ok()?;
        if !output.success {
            return None;
        }
        parse_ifconfig_ether(&output.stdout)
    }

    fn apply_address(&self, name: &InterfaceName, address: MacAddress) -> Result<()> {
        let mac = address.to_string();
        let steps = [
            CommandLine::privileged("ifconfig", &[name.as_str(), "down"], self.sudo),
            CommandLine::privileged("ifconfig", &[name.as_str(), "ether", mac.as_str()], self.sudo),
            CommandLine::privileged("ifconfig", &[name.as_str(), "up"], self.sudo),
        ];

        run_sequence(self.runner.as_ref(), &steps).map_err(|diagnostic| {
            // Do not leave the link down after a failed change.
            if let Err(e) = run_sequence(self.runner.as_ref(), &steps[2..]) {
                warn!("Could not bring {} back up: {}", name, e);
            }
            SpoofError::PlatformApplyFailed {
                interface: name.to_string(),
                diagnostic,
            }
        })
    }
}

fn parse_hardware_ports(output: &str) -> Vec<InterfaceName> {
    output
        .lines()
        .filter_map(|line| line.trim().strip_prefix("Device:"))
        .map(str::trim)
        .filter(|device| !device.is_empty() && !device.starts_with("bridge"))
        .filter_map(|device| InterfaceName::new(device).ok())
        .collect()
}

fn parse_ifconfig_ether(output: &str) -> Option<MacAddress> {
    output
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("ether "))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|token| address::normalize(token).ok())
}
