//! Output formatting utilities for the CLI
//!
//! Colored status messages, pretty JSON and the agents table.

use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use propel_core::types::Agent;

/// Render any serializable value as indented JSON
pub fn format_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

/// Print a value as indented JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<()> {
    println!("{}", format_json(value)?);
    Ok(())
}

/// Re-indent a raw JSON body; non-JSON bodies are returned unchanged
pub fn pretty_body(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| format_json(&v).ok())
        .unwrap_or_else(|| body.to_string())
}

/// Format agents as an ASCII table
///
/// Returns "No agents" for an empty list.
pub fn format_agents(agents: &[Agent]) -> String {
    if agents.is_empty() {
        return "No agents".to_string();
    }

    #[derive(Tabled)]
    struct AgentRow {
        #[tabled(rename = "NAME")]
        name: String,
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "STATE")]
        state: String,
    }

    let rows: Vec<AgentRow> = agents
        .iter()
        .map(|a| AgentRow {
            name: a.name.clone().unwrap_or_else(|| "-".to_string()),
            id: a.id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string()),
            state: a.state().unwrap_or("-").to_string(),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Print a success message in green with a checkmark prefix
pub fn print_success(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Green),
        Print("✓ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an error message in red with an X prefix
///
/// Outputs to stderr.
pub fn print_error(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Red),
        Print("✗ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print a warning message in yellow on stderr
pub fn print_warning(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Yellow),
        Print("⚠ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an informational message in cyan
pub fn print_info(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Cyan),
        Print("ℹ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn agent(value: serde_json::Value) -> Agent {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_format_agents_table() {
        let agents = vec![
            agent(json!({"id": 1, "name": "svc_agent_0", "agent_state": "STARTED"})),
            agent(json!({"agent_state": "DEPLOYED"})),
            agent(json!({"id": 3, "name": "pending", "agent_state": null})),
        ];

        let table = format_agents(&agents);

        assert!(table.contains("NAME"));
        assert!(table.contains("svc_agent_0"));
        assert!(table.contains("STARTED"));
        assert!(table.contains("DEPLOYED"));
        assert!(table.contains("pending"));
    }

    #[test]
    fn test_format_agents_empty() {
        assert_eq!(format_agents(&[]), "No agents");
    }

    #[test]
    fn test_pretty_body() {
        assert_eq!(pretty_body(r#"{"a":1}"#), "{\n  \"a\": 1\n}");
        assert_eq!(pretty_body("plain"), "plain");
    }
}
