//! Command sequence linting.

use tello_core::{CommandValidator, DroneCommand};

/// Parse a sequence file: either a bare list or `{"commands": [...]}`.
/// Every command is validated while deserializing.
pub fn load_sequence(json: &str) -> Result<Vec<DroneCommand>, serde_json::Error> {
    let mut value: serde_json::Value = serde_json::from_str(json)?;
    if let Some(list) = value.get_mut("commands") {
        value = list.take();
    }
    serde_json::from_value(value)
}

#[derive(Debug)]
pub struct LintReport {
    pub commands: Vec<DroneCommand>,
    pub unsafe_commands: Vec<usize>,
    pub warnings: Vec<String>,
}

impl LintReport {
    pub fn new(commands: Vec<DroneCommand>) -> Self {
        let unsafe_commands = commands
            .iter()
            .enumerate()
            .filter(|(_, cmd)| !CommandValidator::is_safe_command(cmd))
            .map(|(i, _)| i)
            .collect();
        let warnings = CommandValidator::validate_command_sequence(&commands);
        Self {
            commands,
            unsafe_commands,
            warnings,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.unsafe_commands.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, cmd) in self.commands.iter().enumerate() {
            let verdict = if self.unsafe_commands.contains(&i) {
                "UNSAFE"
            } else {
                "ok"
            };
            let action = format!("{:?}", cmd.action).to_lowercase();
            out.push_str(&format!(
                "{:>3}. {:<10} {:<6} {}\n",
                i + 1,
                action,
                verdict,
                cmd.description
            ));
        }
        if self.warnings.is_empty() {
            out.push_str("No sequence warnings\n");
        } else {
            for warning in &self.warnings {
                out.push_str(&format!("WARNING: {}\n", warning));
            }
        }
        out
    }
}
