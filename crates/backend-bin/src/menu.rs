//! Interactive register/login loop.
use std::io::{BufRead, Write};

use platform_backend_lib::{
    auth::{AuthService, Authenticator},
    SessionContext,
};

use crate::{prompt, prompt_secret};

const RULE: &str = "==================================================";

fn display_menu<W: Write>(output: &mut W, session: Option<&SessionContext>) -> std::io::Result<()> {
    writeln!(output, "\n{RULE}")?;
    writeln!(output, "  MULTI-DOMAIN INTELLIGENCE PLATFORM")?;
    writeln!(output, "   Secure Authentication System")?;
    if let Some(session) = session {
        writeln!(output, "   Logged in as {} ({})", session.username, session.role)?;
    }
    writeln!(output, "{RULE}")?;
    writeln!(output, "\n[1] Register a new user")?;
    writeln!(output, "[2] Login")?;
    writeln!(output, "[3] Change password")?;
    writeln!(output, "[4] Exit")?;
    writeln!(output, "{RULE}")
}

/// Run the menu until the user exits or input ends. The logged-in user, if
/// any, lives only in this loop's [`SessionContext`].
pub async fn run_menu<R: BufRead, W: Write>(
    auth: &Authenticator,
    input: &mut R,
    output: &mut W,
    hide_secrets: bool,
) -> anyhow::Result<()> {
    let mut session: Option<SessionContext> = None;

    loop {
        display_menu(output, session.as_ref())?;
        let Some(choice) = prompt(input, output, "Enter your choice (1-4): ")? else {
            return Ok(());
        };

        match choice.trim() {
            "1" => {
                let Some(username) = prompt(input, output, "Enter a username: ")? else {
                    return Ok(());
                };
                // report a bad username before asking for a password
                if let Err(e) = auth.policy().validate_username(&username) {
                    writeln!(output, "Error: {e}")?;
                    continue;
                }
                let Some(password) = prompt_secret(input, output, "Enter a password: ", hide_secrets)? else {
                    return Ok(());
                };
                let outcome = auth.register(&username, &password).await?;
                if outcome.ok {
                    writeln!(output, "{}", outcome.message)?;
                } else {
                    writeln!(output, "Error: {}", outcome.message)?;
                }
            },
            "2" => {
                let Some(username) = prompt(input, output, "Enter your username: ")? else {
                    return Ok(());
                };
                let Some(password) = prompt_secret(input, output, "Enter your password: ", hide_secrets)? else {
                    return Ok(());
                };
                let outcome = auth.login(&username, &password).await?;
                match SessionContext::from_login(&username, &outcome) {
                    Some(ctx) => {
                        writeln!(output, "{}", outcome.message)?;
                        session = Some(ctx);
                    },
                    None => writeln!(output, "Login failed: {}", outcome.message)?,
                }
            },
            "3" => {
                let Some(ctx) = session.as_ref() else {
                    writeln!(output, "Please log in first")?;
                    continue;
                };
                let username = ctx.username.clone();
                let Some(old) = prompt_secret(input, output, "Current password: ", hide_secrets)? else {
                    return Ok(());
                };
                let Some(new) = prompt_secret(input, output, "New password: ", hide_secrets)? else {
                    return Ok(());
                };
                if auth.change_password(&username, &old, &new).await? {
                    writeln!(output, "Password changed")?;
                } else {
                    writeln!(output, "Password not changed")?;
                }
            },
            "4" => {
                writeln!(output, "Program closing")?;
                return Ok(());
            },
            _ => writeln!(output, "Please enter 1, 2, 3 or 4 only")?,
        }
    }
}
