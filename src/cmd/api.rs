use anyhow::Result;

use playkey::{ApiClient, PlayError};

use super::Context;

pub async fn cmd_api(ctx: &Context, path: &str) -> Result<()> {
    let mut api = ApiClient::new(ctx.config.api.clone(), ctx.session()?);

    match api.get_json(path).await {
        Ok(json) => {
            println!("{}", serde_json::to_string_pretty(&json)?);
            Ok(())
        }
        Err(PlayError::NoCredentials) => {
            eprintln!("⚠️  No credentials configured, skipping authenticated request");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
