use anyhow::Result;

use playkey::{PlayError, Settings};

use super::Context;

pub async fn cmd_login(ctx: &Context) -> Result<()> {
    let mut session = ctx.session()?;
    session.clear_token()?;

    println!("🔐 Logging in as {}", session.settings().credentials().username);
    match session.token().await {
        Ok(token) => {
            println!("✅ Login successful");
            println!("   Token: {}...", token.chars().take(12).collect::<String>());
            println!("   Cached at: {}", session.cache().path().display());
            Ok(())
        }
        Err(PlayError::NoCredentials) => {
            println!("❌ No credentials configured");
            println!("   Run: playkey configure --username <EMAIL> --password <PASSWORD>");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub fn cmd_logout(ctx: &Context) -> Result<()> {
    let mut session = ctx.session()?;
    session.clear_token()?;
    println!("👋 Token cleared");
    Ok(())
}

pub async fn cmd_token(ctx: &Context) -> Result<()> {
    let mut session = ctx.session()?;
    match session.token().await {
        Ok(token) => {
            println!("{token}");
            Ok(())
        }
        Err(PlayError::NoCredentials) => {
            eprintln!("⚠️  No credentials configured, nothing to do");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
