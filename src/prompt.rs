use std::io::{BufRead, Write};

use crate::address::MacAddress;
use crate::error::{Result, SpoofError};
use crate::platform::InterfaceName;

fn read_answer<R: BufRead>(input: &mut R) -> Result<String> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(SpoofError::Cancelled);
    }
    Ok(line.trim().to_string())
}

/// Numbered interface picker.
pub fn select_interface<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    choices: &[(InterfaceName, Option<MacAddress>)],
) -> Result<InterfaceName> {
    if choices.is_empty() {
        return Err(SpoofError::Config(
            "no network interfaces found, pass one with --interface".to_string(),
        ));
    }

    writeln!(output, "Available interfaces:")?;
    for (i, (name, mac)) in choices.iter().enumerate() {
        let mac = mac.map(|m| m.to_string()).unwrap_or_else(|| "N/A".to_string());
        writeln!(output, "  [{}] {}: {}", i + 1, name, mac)?;
    }
    write!(output, "\nSelect interface (number): ")?;
    output.flush()?;

    let answer = read_answer(input)?;
    match answer.parse::<usize>() {
        Ok(n) if (1..=choices.len()).contains(&n) => Ok(choices[n - 1].0.clone()),
        _ => Err(SpoofError::InvalidInterface(answer)),
    }
}

/// Asks a yes/no question; only `y` or `yes` confirms.
pub fn confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<bool> {
    write!(output, "{} (y/N): ", question)?;
    output.flush()?;
    let answer = read_answer(input)?.to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}
