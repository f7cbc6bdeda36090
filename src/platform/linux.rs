use log::{debug, warn};
use std::fs;
use std::path::PathBuf;

use super::command::run_sequence;
use super::interface::{InterfaceName, PlatformAdapter};
use super::{CommandLine, CommandRunner, PlatformKind};
use crate::address::{self, MacAddress};
use crate::error::{Result, SpoofError};

const SYSFS_NET: &str = "/sys/class/net";

pub struct LinuxAdapter {
    runner: Box<dyn CommandRunner>,
    sudo: bool,
    sysfs_root: PathBuf,
}

impl LinuxAdapter {
    pub fn new(runner: Box<dyn CommandRunner>, sudo: bool) -> Self {
        Self {
            runner,
            sudo,
            sysfs_root: PathBuf::from(SYSFS_NET),
        }
    }

    pub fn with_sysfs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.sysfs_root = root.into();
        self
    }

    fn read_sysfs(&self, name: &InterfaceName) -> Option<MacAddress> {
        let path = self.sysfs_root.join(name.as_str()).join("address");
        let text = fs::read_to_string(&path).ok()?;
        address::normalize(text.trim()).ok()
    }

    fn read_ip_link(&self, name: &InterfaceName) -> Option<MacAddress> {
        let output = CommandLine::new("ip", &["link", "show", "dev", name.as_str()])
            .run(self.runner.as_ref())
            .ok()?;
        if !output.success {
            return None;
        }
        parse_link_ether(&output.stdout)
    }

    fn ip_steps(&self, name: &str, mac: &str) -> Vec<CommandLine> {
        vec![
            CommandLine::privileged("ip", &["link", "set", "dev", name, "down"], self.sudo),
            CommandLine::privileged("ip", &["link", "set", "dev", name, "address", mac], self.sudo),
            CommandLine::privileged("ip", &["link", "set", "dev", name, "up"], self.sudo),
        ]
    }

    fn ifconfig_steps(&self, name: &str, mac: &str) -> Vec<CommandLine> {
        vec![
            CommandLine::privileged("ifconfig", &[name, "down"], self.sudo),
            CommandLine::privileged("ifconfig", &[name, "hw", "ether", mac], self.sudo),
            CommandLine::privileged("ifconfig", &[name, "up"], self.sudo),
        ]
    }
}

impl PlatformAdapter for LinuxAdapter {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Linux
    }

    fn list_interfaces(&self) -> Vec<InterfaceName> {
        match CommandLine::new("ip", &["-o", "link", "show"]).run(self.runner.as_ref()) {
            Ok(output) if output.success => parse_ip_link_names(&output.stdout),
            Ok(output) => {
                warn!("ip link show failed: {}", output.diagnostic());
                Vec::new()
            }
            Err(e) => {
                warn!("{}", e);
                Vec::new()
            }
        }
    }

    fn read_current_address(&self, name: &InterfaceName) -> Option<MacAddress> {
        self.read_sysfs(name).or_else(|| {
            debug!("No sysfs address for {}, asking ip", name);
            self.read_ip_link(name)
        })
    }

    fn apply_address(&self, name: &InterfaceName, address: MacAddress) -> Result<()> {
        let mac = address.to_string();
        let ip_err = match run_sequence(self.runner.as_ref(), &self.ip_steps(name.as_str(), &mac)) {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        warn!("{}; retrying {} with ifconfig", ip_err, name);
        match run_sequence(self.runner.as_ref(), &self.ifconfig_steps(name.as_str(), &mac)) {
            Ok(()) => Ok(()),
            Err(ifconfig_err) => {
                // Do not leave the link down after a failed change.
                let up = CommandLine::privileged("ip", &["link", "set", "dev", name.as_str(), "up"], self.sudo);
                if let Err(e) = run_sequence(self.runner.as_ref(), &[up]) {
                    warn!("Could not bring {} back up: {}", name, e);
                }
                Err(SpoofError::PlatformApplyFailed {
                    interface: name.to_string(),
                    diagnostic: format!("{}; {}", ip_err, ifconfig_err),
                })
            }
        }
    }
}

/// Interface names from `ip -o link show`, minus loopback and container plumbing.
fn parse_ip_link_names(output: &str) -> Vec<InterfaceName> {
    output
        .lines()
        .filter_map(|line| line.split(": ").nth(1))
        .map(|field| field.split('@').next().unwrap_or(field).trim())
        .filter(|name| *name != "lo" && *name != "docker0" && !name.starts_with("veth"))
        .filter_map(|name| InterfaceName::new(name).ok())
        .collect()
}

fn parse_link_ether(output: &str) -> Option<MacAddress> {
    output
        .split_whitespace()
        .skip_while(|token| *token != "link/ether")
        .nth(1)
        .and_then(|token| address::normalize(token).ok())
}
