use log::{debug, warn};

use super::interface::{InterfaceName, PlatformAdapter};
use super::{CommandLine, CommandRunner, PlatformKind};
use crate::address::{self, MacAddress};
use crate::error::{Result, SpoofError};

/// Windows has no sudo; the tool must already run from an elevated shell.
pub struct WindowsAdapter {
    runner: Box<dyn CommandRunner>,
}

impl WindowsAdapter {
    pub fn new(runner: Box<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn powershell(script: &str) -> CommandLine {
        CommandLine::new("powershell", &["-NoProfile", "-NonInteractive", "-Command", script])
    }

    fn stdout_of(&self, command: &CommandLine) -> Option<String> {
        match command.run(self.runner.as_ref()) {
            Ok(output) if output.success => Some(output.stdout),
            Ok(output) => {
                debug!("`{}` failed: {}", command, output.diagnostic());
                None
            }
            Err(e) => {
                debug!("{}", e);
                None
            }
        }
    }
}

impl PlatformAdapter for WindowsAdapter {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Windows
    }

    fn list_interfaces(&self) -> Vec<InterfaceName> {
        let adapters = Self::powershell("Get-NetAdapter | ForEach-Object { $_.Name }");
        if let Some(stdout) = self.stdout_of(&adapters) {
            let names = parse_name_lines(&stdout, None);
            if !names.is_empty() {
                return names;
            }
        }

        warn!("Get-NetAdapter gave no adapters, falling back to wmic");
        let wmic = CommandLine::new("wmic", &["path", "win32_networkadapter", "get", "NetConnectionID"]);
        self.stdout_of(&wmic)
            .map(|stdout| parse_name_lines(&stdout, Some("NetConnectionID")))
            .unwrap_or_default()
    }

    fn read_current_address(&self, name: &InterfaceName) -> Option<MacAddress> {
        let getmac = CommandLine::new("getmac", &["/fo", "csv", "/nh", "/v"]);
        let stdout = self.stdout_of(&getmac)?;
        parse_getmac_csv(&stdout, name)
    }

    fn apply_address(&self, name: &InterfaceName, address: MacAddress) -> Result<()> {
        let script = format!(
            "Set-NetAdapter -Name \"{}\" -MacAddress \"{}\" -Confirm:$false",
            name,
            address.to_hyphenated()
        );
        let command = Self::powershell(&script);
        let output = command
            .run(self.runner.as_ref())
            .map_err(|e| SpoofError::PlatformApplyFailed {
                interface: name.to_string(),
                diagnostic: e.to_string(),
            })?;
        if output.success {
            Ok(())
        } else {
            Err(SpoofError::PlatformApplyFailed {
                interface: name.to_string(),
                diagnostic: output.diagnostic(),
            })
        }
    }
}

/// One adapter name per line, skipping blanks and an optional column header.
fn parse_name_lines(output: &str, header: Option<&str>) -> Vec<InterfaceName> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && Some(*line) != header)
        .filter_map(|line| InterfaceName::new(line).ok())
        .collect()
}

/// Finds the physical address of `name` in verbose `getmac` CSV output:
/// `"Connection Name","Network Adapter","Physical Address","Transport Name"`.
fn parse_getmac_csv(output: &str, name: &InterfaceName) -> Option<MacAddress> {
    output.lines().find_map(|line| {
        let fields: Vec<&str> = line
            .trim()
            .split(',')
            .map(|field| field.trim().trim_matches('"'))
            .collect();
        if fields.len() < 3 || !fields[0].eq_ignore_ascii_case(name.as_str()) {
            return None;
        }
        address::normalize(fields[2]).ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::command::{CommandOutput, MockCommandRunner};

    const GETMAC: &str = "\
\"Ethernet\",\"Intel(R) Ethernet Connection I219-V\",\"00-1B-21-AA-BB-CC\",\"\\Device\\Tcpip_{4D36E972-E325-11CE}\"\r
\"Wi-Fi\",\"Intel(R) Wi-Fi 6 AX201 160MHz\",\"3C-6A-A7-11-22-33\",\"\\Device\\Tcpip_{8F2B1C9E-0A44-4C1B}\"\r
\"Bluetooth Network Connection\",\"Bluetooth Device (Personal Area Network)\",\"5C-BA-EF-01-02-03\",\"Media disconnected\"\r
\"Ethernet 2\",\"TAP-Windows Adapter V9\",\"N/A\",\"Hardware not present\"\r
";

    fn name(text: &str) -> InterfaceName {
        InterfaceName::new(text).unwrap()
    }

    #[test]
    fn test_parse_getmac() {
        assert_eq!(
            parse_getmac_csv(GETMAC, &name("Wi-Fi")).unwrap().to_string(),
            "3C:6A:A7:11:22:33"
        );
        assert_eq!(
            parse_getmac_csv(GETMAC, &name("ethernet")).unwrap().to_string(),
            "00:1B:21:AA:BB:CC"
        );
        assert_eq!(parse_getmac_csv(GETMAC, &name("Ethernet 2")), None);
        assert_eq!(parse_getmac_csv(GETMAC, &name("Ethernet 3")), None);
    }

    #[test]
    fn test_list_from_get_net_adapter() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|p, _| p == "powershell")
            .returning(|_, _| Ok(CommandOutput::ok("Ethernet\r\nWi-Fi\r\n\r\n")));

        let adapter = WindowsAdapter::new(Box::new(runner));
        let names: Vec<String> = adapter
            .list_interfaces()
            .into_iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, vec!["Ethernet", "Wi-Fi"]);
    }

    #[test]
    fn test_list_falls_back_to_wmic() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|p, _| p == "powershell")
            .returning(|_, _| Ok(CommandOutput::failed(1, "Get-NetAdapter : Access is denied.")));
        runner
            .expect_run()
            .withf(|p, _| p == "wmic")
            .returning(|_, _| {
                Ok(CommandOutput::ok(
                    "NetConnectionID  \r\n\r\nEthernet  \r\n\r\nWi-Fi  \r\n\r\n",
                ))
            });

        let adapter = WindowsAdapter::new(Box::new(runner));
        assert_eq!(adapter.list_interfaces().len(), 2);
    }

    #[test]
    fn test_apply_uses_set_net_adapter() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|p, a| {
                p == "powershell"
                    && a.last().map(String::as_str)
                        == Some("Set-NetAdapter -Name \"Ethernet 2\" -MacAddress \"02-AA-BB-CC-DD-EE\" -Confirm:$false")
            })
            .times(1)
            .returning(|_, _| Ok(CommandOutput::ok("")));

        let adapter = WindowsAdapter::new(Box::new(runner));
        adapter
            .apply_address(&name("Ethernet 2"), "02:aa:bb:cc:dd:ee".parse().unwrap())
            .unwrap();
    }

    #[test]
    fn test_apply_without_powershell() {
        let mut runner = MockCommandRunner::new();
        runner.expect_run().returning(|program, _| {
            Err(SpoofError::Command {
                program: program.to_string(),
                reason: "program not found".into(),
            })
        });

        let adapter = WindowsAdapter::new(Box::new(runner));
        let err = adapter
            .apply_address(&name("Ethernet"), "02:aa:bb:cc:dd:ee".parse().unwrap())
            .unwrap_err();
        assert!(matches!(
            err,
            SpoofError::PlatformApplyFailed { ref diagnostic, .. } if diagnostic.contains("program not found")
        ));
    }

    #[test]
    fn test_apply_failure() {
        let mut runner = MockCommandRunner::new();
        runner.expect_run().returning(|_, _| {
            Ok(CommandOutput::failed(1, "Set-NetAdapter : Access is denied."))
        });

        let adapter = WindowsAdapter::new(Box::new(runner));
        match adapter.apply_address(&name("Ethernet"), "02:aa:bb:cc:dd:ee".parse().unwrap()) {
            Err(SpoofError::PlatformApplyFailed { interface, diagnostic }) => {
                assert_eq!(interface, "Ethernet");
                assert_eq!(diagnostic, "Set-NetAdapter : Access is denied.");
            }
            other => panic!("expected PlatformApplyFailed, got {:?}", other),
        }
    }
}
