use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use menuhub_client::MenuClient;

pub async fn login(client: &MenuClient, username: &str, password: &str) -> Result<()> {
    println!("{}", "Signing in...".cyan());
    let credential = client.login(username, password).await?;

    let name = client
        .store()
        .load()?
        .and_then(|s| s.fullname)
        .unwrap_or_else(|| username.to_string());
    println!("{} Signed in as {}", "✓".green(), name.green());
    println!("  Session valid until {}", format_expiry(credential.access_token_expires_at));
    Ok(())
}

pub fn logout(client: &MenuClient) -> Result<()> {
    client.logout()?;
    println!("{} Signed out", "✓".green());
    Ok(())
}

pub fn whoami(client: &MenuClient, json: bool) -> Result<()> {
    let session = client.store().load()?;

    if json {
        let value = match &session {
            Some(s) => serde_json::json!({
                "fullname": s.fullname,
                "hasAccessToken": s.access_token.is_some(),
                "hasRefreshToken": s.refresh_token.is_some(),
                "accessExpiresAt": s.access_expires_at,
                "refreshExpiresAt": s.refresh_expires_at,
            }),
            None => serde_json::Value::Null,
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let Some(session) = session else {
        println!("{}", "Not signed in.".yellow());
        return Ok(());
    };

    println!("{}", "Menuhub Session".cyan().bold());
    println!("  User: {}", session.fullname.as_deref().unwrap_or("-"));
    println!(
        "  Access token: {}",
        token_status(session.access_token.is_some(), session.access_expires_at)
    );
    println!(
        "  Refresh token: {}",
        token_status(session.refresh_token.is_some(), session.refresh_expires_at)
    );
    if !session.is_complete() {
        println!("{}", "  Session is incomplete; the next request will sign you out.".yellow());
    }
    Ok(())
}

fn token_status(present: bool, expires_at: Option<i64>) -> String {
    match (present, expires_at) {
        (false, _) => "missing".red().to_string(),
        (true, Some(ts)) => format!("{} (until {})", "present".green(), format_expiry(ts)),
        (true, None) => "present".green().to_string(),
    }
}

fn format_expiry(ts: i64) -> String {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}
