//! Login, logout and the OpenAI passthrough

use std::io::{self, BufRead, IsTerminal, Read, Write};

use anyhow::{bail, Context, Result};
use serde_json::Value;

use crate::output::{pretty_body, print_success};
use crate::session::Session;

fn prompt_username() -> Result<String> {
    let stdin = io::stdin();
    loop {
        print!("Username: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            bail!("No username given");
        }
        let username = line.trim();
        if !username.is_empty() {
            return Ok(username.to_string());
        }
    }
}

fn prompt_password() -> Result<String> {
    if !io::stdin().is_terminal() {
        bail!("Cannot read password from stdin. Use --password.");
    }
    loop {
        let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;
        if !password.is_empty() {
            return Ok(password);
        }
    }
}

/// Log in, prompting for whatever was not given
pub async fn login_command(
    session: &Session,
    username: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let username = match username.filter(|u| !u.is_empty()) {
        Some(u) => u,
        None => prompt_username()?,
    };
    let password = match password.filter(|p| !p.is_empty()) {
        Some(p) => p,
        None => prompt_password()?,
    };

    session.client.login(&username, &password).await?;

    print_success("Logged in");
    Ok(())
}

pub async fn logout_command(session: &Session) -> Result<()> {
    session.client.logout().await?;
    print_success("Logged out!");
    Ok(())
}

/// Parse an optional JSON payload; `-` reads it from `input`
pub fn parse_payload(raw: Option<&str>, input: impl Read) -> Result<Option<Value>> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let text = if raw == "-" {
        let mut buf = String::new();
        let mut input = input;
        input
            .read_to_string(&mut buf)
            .context("Failed to read payload from stdin")?;
        buf
    } else {
        raw.to_string()
    };

    match serde_json::from_str(&text) {
        Ok(value) => Ok(Some(value)),
        Err(_) => bail!("payload not a valid json!"),
    }
}

/// Call an OpenAI endpoint through the service and print the reply
pub async fn call_command(session: &Session, path: &str, payload: Option<&str>) -> Result<()> {
    let payload = parse_payload(payload, io::stdin())?;
    let body = session.client.openai(path, payload).await?;
    println!("{}", pretty_body(&body));
    Ok(())
}
