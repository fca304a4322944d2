use crate::application::connections::ConnectionListing;
use crate::domain::entities::{Connection, Response};
use anyhow::{Result, anyhow};
use colored::Colorize;
use serde_json::Value;

pub fn print_response_body(body: &str) -> Result<()> {
    match serde_json::from_str::<Value>(body) {
        Ok(json) => {
            let pretty = serde_json::to_string_pretty(&json)
                .map_err(|e| anyhow!("Failed to format JSON: {}", e))?;
            println!("{}", pretty.green());
        }
        Err(_) => println!("{}", body.white()),
    }
    Ok(())
}

/// Prints a response: timing and status first unless `json` asks for the bare body.
pub fn print_response(response: &Response, json: bool) -> Result<()> {
    if json {
        println!("{}", response.body);
        return Ok(());
    }
    println!("{}", format_elapsed(response).bold());
    let status = format!("Status: {}", response.status);
    if response.status.is_success() {
        println!("{}", status.cyan());
    } else {
        println!("{}", status.red());
    }
    if !response.body.is_empty() {
        print_response_body(&response.body)?;
    }
    Ok(())
}

fn format_elapsed(response: &Response) -> String {
    let millis = response.elapsed.as_millis();
    if millis < 1000 {
        format!("Command took {} milliseconds", millis)
    } else {
        format!("Command took {:.4} seconds", response.elapsed.as_secs_f64())
    }
}

pub fn print_connection_list(listing: &[ConnectionListing], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(listing)?);
        return Ok(());
    }
    if listing.is_empty() {
        println!("{}", "There were no connections.".bold());
        return Ok(());
    }

    let width = listing
        .iter()
        .map(|l| l.connection.name.len())
        .chain(std::iter::once("Name".len()))
        .max()
        .unwrap_or(0);

    println!("{}", format!("    {:<width$}   {}", "Name", "URL", width = width).bold());
    for entry in listing {
        let name = format!("{:<width$}", entry.connection.name, width = width);
        if entry.current {
            println!(
                "{}   {}   {}",
                " * ".green(),
                name.green(),
                entry.connection.service_url.bright_cyan()
            );
        } else {
            println!("    {}   {}", name, entry.connection.service_url.bright_cyan());
        }
    }
    Ok(())
}

pub fn print_connection_details(connections: &[Connection], json: bool) -> Result<()> {
    if json {
        let masked: Vec<Connection> = connections
            .iter()
            .map(|c| Connection {
                auth_token: c.masked_token(),
                ..c.clone()
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&masked)?);
        return Ok(());
    }

    for conn in connections {
        println!("{}", conn.name.bold());
        println!("  {:<12}{}", "URL:", conn.service_url.bright_cyan());
        println!("  {:<12}{}", "Token:", conn.masked_token());
        if conn.headers.is_empty() {
            println!("  {:<12}{}", "Headers:", "none".dimmed());
        } else {
            println!("  Headers:");
            let mut headers: Vec<_> = conn.headers.iter().collect();
            headers.sort();
            for (name, value) in headers {
                println!("    {}: {}", name, value);
            }
        }
    }
    Ok(())
}

/// One row of the `flags` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSetting {
    pub name: String,
    pub short: Option<char>,
    pub value: String,
    pub default: String,
}

pub fn print_flags(flags: &[FlagSetting]) {
    println!("{}", "Flags are:".bold());
    print!("{}", format_flags(flags));
}

fn format_flags(flags: &[FlagSetting]) -> String {
    let width = flags
        .iter()
        .map(|f| f.name.len())
        .chain(std::iter::once("Name".len()))
        .max()
        .unwrap_or(0);
    let mut out = format!("{:<width$}  {:<5}  {}  ({})\n", "Name", "Short", "Value", "default", width = width);
    for flag in flags {
        let short = flag.short.map(|c| format!("-{}", c)).unwrap_or_default();
        out.push_str(&format!(
            "{:<width$}  {:<5}  {}  ({})\n",
            flag.name,
            short,
            flag.value,
            flag.default,
            width = width
        ));
    }
    out
}

/// Prints merged settings as `key: value` lines, nested maps indented.
pub fn print_settings(settings: &Value) {
    println!("{}", "Settings are:".bold());
    print!("{}", format_settings(settings, 0));
}

const MAX_VALUE_LEN: usize = 60;

fn format_settings(value: &Value, depth: usize) -> String {
    let Value::Object(map) = value else {
        return String::new();
    };
    let indent = "  ".repeat(depth);
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();

    let mut out = String::new();
    for key in keys {
        match &map[key.as_str()] {
            nested @ Value::Object(_) => {
                out.push_str(&format!("{}{}:\n", indent, key));
                out.push_str(&format_settings(nested, depth + 1));
            }
            Value::String(s) => {
                out.push_str(&format!("{}{}: {}\n", indent, key, truncate(s)));
            }
            other => out.push_str(&format!("{}{}: {}\n", indent, key, other)),
        }
    }
    out
}

fn truncate(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= MAX_VALUE_LEN {
        return s.to_string();
    }
    let half = MAX_VALUE_LEN / 2;
    let head: String = chars[..half].iter().collect();
    let tail: String = chars[chars.len() - half..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::StatusCode;
    use serde_json::json;
    use std::time::Duration;

    fn response(elapsed: Duration) -> Response {
        Response {
            status: StatusCode::OK,
            body: String::new(),
            elapsed,
        }
    }

    #[test]
    fn elapsed_under_a_second_is_in_milliseconds() {
        assert_eq!(
            format_elapsed(&response(Duration::from_millis(250))),
            "Command took 250 milliseconds"
        );
        assert!(format_elapsed(&response(Duration::from_millis(1500))).contains("seconds"));
    }

    #[test]
    fn settings_are_sorted_and_nested() {
        let settings = json!({
            "verbose": false,
            "connections": {"prod": {"serviceURL": "http://p"}},
        });
        assert_eq!(
            format_settings(&settings, 0),
            "connections:\n  prod:\n    serviceURL: http://p\nverbose: false\n"
        );
    }

    #[test]
    fn flags_table_lines_up_columns() {
        let flags = vec![
            FlagSetting {
                name: "json".to_string(),
                short: Some('j'),
                value: "true".to_string(),
                default: "false".to_string(),
            },
            FlagSetting {
                name: "config".to_string(),
                short: None,
                value: String::new(),
                default: String::new(),
            },
        ];
        assert_eq!(
            format_flags(&flags),
            "Name    Short  Value  (default)\njson    -j     true  (false)\nconfig           ()\n"
        );
    }

    #[test]
    fn long_values_are_truncated_in_the_middle() {
        let long = "x".repeat(100);
        let short = truncate(&long);
        assert_eq!(short.len(), MAX_VALUE_LEN + 3);
        assert!(short.contains("..."));
        assert_eq!(truncate("short"), "short");
    }
}
