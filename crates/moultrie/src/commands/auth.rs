//! `moultrie auth`: sign in or redeem a refresh token, then write the
//! token files.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use secrecy::SecretString;

use moultrie_api::{LoginFlow, TokenClaims, TokenResponse, TransportConfig};
use moultrie_config::TokenFiles;

use crate::cli::{AuthArgs, GlobalOpts};
use crate::config::{self, Context};
use crate::error::CliError;
use crate::output;

pub async fn handle(args: AuthArgs, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let files = args
        .out_dir
        .clone()
        .map_or_else(|| ctx.token_files.clone(), TokenFiles::new);

    let timeout = global
        .timeout
        .or(ctx.profile.timeout)
        .unwrap_or(ctx.config.defaults.timeout);
    let login = LoginFlow::new(
        config::endpoints(global)?,
        TransportConfig::default().with_timeout(Duration::from_secs(timeout)),
    );

    let response = match args.refresh {
        Some(token) => {
            let token = refresh_token(token, &files)?;
            let spinner = spinner(global, "Refreshing tokens...");
            let response = login.refresh(&token).await;
            spinner.finish_and_clear();
            response?
        }
        None => {
            let password = args.password.map(SecretString::from);
            let credentials = match ctx.credentials(args.email.as_deref(), password) {
                Ok(credentials) => credentials,
                Err(CliError::NoCredentials { .. }) if args.email.is_some() => {
                    let email = args.email.clone().unwrap_or_default();
                    moultrie_core::Credentials::new(email, prompt_password()?)
                }
                Err(e) => return Err(e),
            };

            let spinner = spinner(global, "Signing in...");
            let response = login
                .authenticate(&credentials.email, &credentials.password)
                .await;
            spinner.finish_and_clear();
            response?
        }
    };

    let pair = response.token_pair()?;
    let raw = serde_json::to_value(&response)?;
    files.save(&pair, Some(&raw))?;
    tracing::info!(dir = %files.dir().display(), "token files written");

    if !global.quiet {
        output::print_output(&summary(&response, &files), false);
    }
    Ok(())
}

/// `--refresh TOKEN` wins; bare `--refresh` reads the saved `.refresh`.
fn refresh_token(flag: Option<String>, files: &TokenFiles) -> Result<SecretString, CliError> {
    if let Some(token) = flag.filter(|t| !t.trim().is_empty()) {
        return Ok(SecretString::from(token.trim().to_owned()));
    }
    files
        .load_refresh_token()?
        .ok_or_else(|| CliError::NoRefreshToken {
            path: files.refresh_path().display().to_string(),
        })
}

fn prompt_password() -> Result<SecretString, CliError> {
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NoCredentials {
            profile: "current".into(),
        });
    }
    let password = rpassword::prompt_password("Password: ")?;
    Ok(SecretString::from(password))
}

fn spinner(global: &GlobalOpts, message: &'static str) -> ProgressBar {
    if !output::interactive(global.quiet) {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

fn summary(response: &TokenResponse, files: &TokenFiles) -> String {
    let claims = response
        .access_token
        .as_deref()
        .and_then(TokenClaims::decode);

    let mut lines = vec![format!(
        "{} tokens written to {}",
        output::good("✓"),
        files.dir().display()
    )];
    if let Some(claims) = claims {
        lines.push(format!("Email:    {}", output::or_dash(claims.email())));
        lines.push(format!("MMId:     {}", output::or_dash(claims.member_id())));
        lines.push(format!(
            "Expires:  {}",
            output::or_dash(claims.expires_at().map(|t| t.to_rfc3339()))
        ));
    } else if let Some(expires_in) = response.expires_in {
        lines.push(format!("Expires:  in {expires_in}s"));
    }
    lines.join("\n")
}
