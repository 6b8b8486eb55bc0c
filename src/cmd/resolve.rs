use anyhow::Result;
use serde::Serialize;

use playkey::{Category, KeyType, ResolvedStream, StreamProvider, StreamResolver};

use super::{as_pairs, parse_headers, Context};

/// What a player needs to start playback.
#[derive(Serialize)]
struct PlayItem<'a> {
    #[serde(flatten)]
    stream: &'a ResolvedStream,
    manifest_type: &'static str,
    license_key: String,
}

pub async fn cmd_resolve(
    ctx: &Context,
    category: Category,
    id: &str,
    key_type: KeyType,
    headers: &[String],
    key_value: Option<&str>,
    json: bool,
) -> Result<()> {
    let settings = ctx.settings()?;
    let resolver = StreamResolver::new(&ctx.config, ctx.client(&settings)?);

    if !json {
        eprintln!("🎬 Provider: {}", resolver.name());
        eprintln!("📡 Resolving {category}/{id}");
    }

    let stream = resolver.resolve(category, id).await?;

    // License requests default to the same identity as the manifest fetch
    let headers = if headers.is_empty() {
        ctx.config
            .provider
            .headers()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    } else {
        parse_headers(headers)?
    };
    let license_key = stream.license_key(key_type, &as_pairs(&headers), key_value)?;

    if json {
        let item = PlayItem {
            stream: &stream,
            manifest_type: stream.manifest_kind().as_str(),
            license_key,
        };
        println!("{}", serde_json::to_string_pretty(&item)?);
        return Ok(());
    }

    match stream.program_title {
        Some(ref program) => println!("📺 {program}: {}", stream.title),
        None => println!("📺 {}", stream.title),
    }
    if let Some(dur) = stream.duration_seconds {
        println!("   Duration: {}:{:02}", dur / 60, dur % 60);
    }
    println!("   Manifest ({}): {}", stream.manifest_kind().as_str(), stream.manifest_url);
    println!("   License: {}", stream.license_url);
    println!("   License key: {license_key}");
    if let Some(ref cookies) = stream.session_cookies {
        println!("   Cookies: {cookies}");
    }

    Ok(())
}
