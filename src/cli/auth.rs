//! CLI auth command handlers for login, status, and logout.

use std::io::Write;

use crate::auth::SessionStatus;
use crate::client::ApiClient;

/// Handle `hitos auth login`.
pub async fn handle_login(
    client: &ApiClient,
    username: &str,
    password: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let password = match password {
        Some(password) => password,
        None => {
            print!("Password: ");
            std::io::stdout().flush()?;
            let mut line = String::new();
            std::io::stdin().read_line(&mut line)?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };
    if password.is_empty() {
        return Err("no password provided".into());
    }

    client.auth().login(username, &password).await?;
    println!("✅ Logged in as {username}");
    Ok(())
}

/// Handle `hitos auth status`.
pub async fn handle_status(client: &ApiClient) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔐 Session ({})\n", client.config().base_url);
    match client.auth().status()? {
        SessionStatus::LoggedOut => println!("  ❌ Not logged in"),
        SessionStatus::Active { expires_at } => match expires_at {
            Some(at) => println!("  ✅ Logged in (expires {})", at.format("%Y-%m-%d %H:%M")),
            None => println!("  ✅ Logged in"),
        },
        SessionStatus::Stale { .. } => {
            println!("  ⚠️  Token expiring or expired (refreshes on next request)")
        }
    }
    Ok(())
}

/// Handle `hitos auth logout`.
pub async fn handle_logout(client: &ApiClient) -> Result<(), Box<dyn std::error::Error>> {
    client.auth().logout()?;
    println!("✅ Logged out");
    Ok(())
}
