use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use platform_backend_lib::{
    auth::{AuthService, Authenticator},
    bootstrap,
    config::Settings,
    storage::import_legacy_users,
    Role, SessionContext,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod menu;

/// Account administration for the intelligence platform.
#[derive(Parser, Debug)]
#[command(name = "platform-auth", version, about)]
struct Cli {
    /// Config file (defaults to ./platform.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account; the password is read from stdin
    Register {
        username: String,
        #[arg(long, default_value = Role::DEFAULT)]
        role: String,
    },
    /// Check a username/password pair
    Login { username: String },
    /// Change a password after confirming the current one
    ChangePassword { username: String },
    /// Administrative user operations
    #[command(subcommand)]
    Users(UsersCommand),
    /// Import a legacy `users.txt` credential file
    Import { file: PathBuf },
    /// Interactive register/login menu
    Menu,
}

#[derive(Subcommand, Debug)]
enum UsersCommand {
    /// List users and their roles
    List,
    /// Change a user's role
    SetRole { username: String, role: String },
    /// Delete a user
    Delete { username: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Settings::load().context("loading config")?,
    };

    // Initialize tracing; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let auth = bootstrap(&settings)?;
    debug!(command = ?cli.command, "dispatching command");
    let hide_secrets = io::stdin().is_terminal();
    let ok = run(cli.command, &auth, hide_secrets).await?;
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

async fn run(command: Command, auth: &Authenticator, hide_secrets: bool) -> anyhow::Result<bool> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    match command {
        Command::Register { username, role } => {
            let Some(password) = prompt_secret(&mut input, &mut output, "Password: ", hide_secrets)? else {
                return Ok(false);
            };
            let outcome = auth.register_with_role(&username, &password, Role::from(role)).await?;
            writeln!(output, "{}", outcome.message)?;
            Ok(outcome.ok)
        },
        Command::Login { username } => {
            let Some(password) = prompt_secret(&mut input, &mut output, "Password: ", hide_secrets)? else {
                return Ok(false);
            };
            let outcome = auth.login(&username, &password).await?;
            match SessionContext::from_login(&username, &outcome) {
                Some(session) => writeln!(output, "{} (role: {})", outcome.message, session.role)?,
                None => writeln!(output, "{}", outcome.message)?,
            }
            Ok(outcome.ok)
        },
        Command::ChangePassword { username } => {
            let Some(old) = prompt_secret(&mut input, &mut output, "Current password: ", hide_secrets)? else {
                return Ok(false);
            };
            let Some(new) = prompt_secret(&mut input, &mut output, "New password: ", hide_secrets)? else {
                return Ok(false);
            };
            let changed = auth.change_password(&username, &old, &new).await?;
            writeln!(
                output,
                "{}",
                if changed { "Password changed" } else { "Password not changed" }
            )?;
            Ok(changed)
        },
        Command::Users(UsersCommand::List) => {
            for user in auth.store().list_users().await? {
                writeln!(
                    output,
                    "{:<24} {:<12} {}",
                    user.username,
                    user.role.as_str(),
                    user.created_at.format("%Y-%m-%d %H:%M:%S")
                )?;
            }
            Ok(true)
        },
        Command::Users(UsersCommand::SetRole { username, role }) => {
            auth.store().update_role(&username, &Role::from(role)).await?;
            writeln!(output, "Role updated for {username}")?;
            Ok(true)
        },
        Command::Users(UsersCommand::Delete { username }) => {
            auth.store().delete_user(&username).await?;
            writeln!(output, "Deleted {username}")?;
            Ok(true)
        },
        Command::Import { file } => {
            let report = import_legacy_users(auth.store().as_ref(), &file).await?;
            writeln!(
                output,
                "Imported {} user(s), skipped {}",
                report.imported, report.skipped
            )?;
            Ok(true)
        },
        Command::Menu => {
            menu::run_menu(auth, &mut input, &mut output, hide_secrets).await?;
            Ok(true)
        },
    }
}

/// Print `label` and read one line. `None` at end of input.
pub(crate) fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
) -> anyhow::Result<Option<String>> {
    write!(output, "{label}")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Like [`prompt`], but for passwords: on a terminal the typed characters
/// are not echoed.
pub(crate) fn prompt_secret<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
    hidden: bool,
) -> anyhow::Result<Option<String>> {
    if !hidden {
        return prompt(input, output, label);
    }

    output.flush()?;
    match rpassword::prompt_password(label) {
        Ok(secret) => Ok(Some(secret)),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e).context("failed to read password"),
    }
}
