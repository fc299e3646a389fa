use std::io::{self, IsTerminal, Write};

use crate::cli::AccountCommand;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::session::{AccountService, AccountStatus, LoginResult, Registration};

pub async fn run(ctx: &AppContext, command: AccountCommand) -> AppResult<()> {
    let provider = ctx.provider.as_ref();
    let store = &ctx.session_store;
    let profile = ctx.profile.as_str();

    match command {
        AccountCommand::Domains => {
            let domains = AccountService::domains(provider).await?;
            let text = if domains.is_empty() {
                "no domains available".to_string()
            } else {
                domains
                    .iter()
                    .map(|domain| {
                        let mut line = domain.domain.clone();
                        if !domain.is_active {
                            line.push_str(" (inactive)");
                        }
                        if domain.is_private {
                            line.push_str(" (private)");
                        }
                        line
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            ctx.output.emit(&text, &domains)
        }
        AccountCommand::Create(args) => {
            let registration = Registration {
                username: args.username,
                domain: args.domain,
                password: args.password,
            };
            let result = AccountService::register(provider, store, profile, registration).await?;
            ctx.output.emit(&login_text(&result), &result)
        }
        AccountCommand::Login(args) => {
            let password = match args.password {
                Some(password) => password,
                None => prompt_password(&args.address)?,
            };
            let result =
                AccountService::login(provider, store, profile, args.address.trim(), &password)
                    .await?;
            ctx.output.emit(&login_text(&result), &result)
        }
        AccountCommand::Ls => {
            let status = AccountService::status(store, profile)?;
            let text = if status.accounts.is_empty() {
                format!("{}: no stored accounts", status.profile)
            } else {
                status
                    .accounts
                    .iter()
                    .map(|account| {
                        let marker = if account.active { "*" } else { " " };
                        format!("{marker} {} ({})", account.email, account.label)
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            ctx.output.emit(&text, &status.accounts)
        }
        AccountCommand::Switch(args) => {
            let status = AccountService::switch(store, profile, &args.address)?;
            ctx.output.emit(&status_text(&status), &status)
        }
        AccountCommand::Status => {
            let status = AccountService::status(store, profile)?;
            ctx.output.emit(&status_text(&status), &status)
        }
        AccountCommand::Logout(args) => {
            let status = AccountService::logout(store, profile, args.all)?;
            let text = match status.note.as_deref() {
                Some(note) => format!("{}: {note}", status.profile),
                None => format!("{}: logged out", status.profile),
            };
            ctx.output.emit(&text, &status)
        }
        AccountCommand::Delete => {
            let result = AccountService::delete(provider, store, profile).await;
            let status = ctx.handle_rejected_session(result)?;
            ctx.output.emit(&status_text(&status), &status)
        }
    }
}

fn login_text(result: &LoginResult) -> String {
    let mut text = format!("{}: logged in as {}", result.profile, result.address);
    if let Some(password) = result.generated_password.as_deref() {
        text.push_str(&format!("\npassword: {password}"));
    }
    text
}

fn status_text(status: &AccountStatus) -> String {
    if !status.logged_in {
        return match status.note.as_deref() {
            Some(note) => format!("{}: logged out ({note})", status.profile),
            None => format!("{}: logged out", status.profile),
        };
    }

    let address = status
        .address
        .as_ref()
        .map(|address| format!(" as {address}"))
        .unwrap_or_default();
    let expiry = status
        .expires_in_seconds
        .map(|seconds| format!(" (session expires in {}h {}m)", seconds / 3600, (seconds % 3600) / 60))
        .unwrap_or_default();
    format!("{}: logged in{address}{expiry}", status.profile)
}

fn prompt_password(address: &str) -> AppResult<String> {
    if !io::stdin().is_terminal() {
        return Err(AppError::InvalidInput(
            "--password is required when stdin is not a terminal".to_string(),
        ));
    }

    let mut stdout = io::stdout();
    write!(stdout, "password for {address}: ")?;
    stdout.flush()?;

    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    let value = value.trim_end_matches(['\r', '\n']).to_string();
    if value.is_empty() {
        return Err(AppError::InvalidInput("password is required".to_string()));
    }
    Ok(value)
}
