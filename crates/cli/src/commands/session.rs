//! Session commands: login, logout, whoami.
//!
//! # Usage
//!
//! ```bash
//! # Provider login with a pre-acquired ID token
//! aura login --token <ID_TOKEN>
//!
//! # Interactive provider login (paste the token; empty input cancels)
//! aura login
//!
//! # Developer login (only while the backend advertises dev mode)
//! aura login --dev --name "Dev User" --admin
//! ```

use std::io::{BufRead, Write};

use aura_client::api::types::DevLoginRequest;
use aura_client::error::Result;
use aura_client::session::{LoginOutcome, ProviderCredential};

use super::Shell;

/// Log in by exchanging a provider ID token for a backend session.
///
/// With no token argument the user is prompted; dismissing the prompt
/// (empty input) cancels silently, which is not an error.
pub async fn login_provider(shell: &mut Shell, token: Option<String>) -> Result<()> {
    let credential = match token {
        Some(token) => ProviderCredential::IdToken(token),
        None => prompt_for_token(),
    };

    match shell.session.login_with_provider(credential).await? {
        LoginOutcome::LoggedIn(user) => {
            println!("Welcome, {}!", user.name);
        }
        LoginOutcome::Cancelled => {
            println!("Login cancelled.");
        }
    }
    Ok(())
}

/// Log in through the backend-gated developer shortcut.
pub async fn login_dev(
    shell: &mut Shell,
    name: Option<String>,
    email: Option<String>,
    admin: bool,
) -> Result<()> {
    let mut request = DevLoginRequest {
        is_admin: admin,
        ..DevLoginRequest::default()
    };
    if let Some(name) = name {
        request.name = name;
    }
    if let Some(email) = email {
        request.email = email;
    }

    let user = shell.session.login_as_developer(request).await?;
    println!("Welcome, {}! (developer login)", user.name);
    Ok(())
}

/// Log out and discard local credentials. The cart is intentionally left
/// alone; it belongs to the device, not the identity.
pub fn logout(shell: &mut Shell) -> Result<()> {
    shell.session.logout();
    println!("Logged out.");
    Ok(())
}

/// Show the current user.
pub fn whoami(shell: &Shell) -> Result<()> {
    match shell.session.user() {
        Some(user) => {
            println!("{} <{}>", user.name, user.email);
            println!("  role: {:?}", user.role);
            if shell.session.is_admin() {
                println!("  admin views: available");
            }
        }
        None => println!("Not logged in."),
    }
    Ok(())
}

/// Read a provider token from stdin. Empty input (or an unreadable stdin)
/// means the user dismissed the prompt.
fn prompt_for_token() -> ProviderCredential {
    print!("Paste provider ID token (empty to cancel): ");
    let _ = std::io::stdout().flush();

    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line).is_err() {
        return ProviderCredential::Cancelled;
    }

    let token = line.trim();
    if token.is_empty() {
        ProviderCredential::Cancelled
    } else {
        ProviderCredential::IdToken(token.to_string())
    }
}
