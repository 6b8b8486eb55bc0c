use anyhow::Result;

use playkey::settings::{
    KEY_PASSWORD, KEY_PROXY_PASSWORD, KEY_PROXY_URL, KEY_PROXY_USERNAME, KEY_USERNAME,
};
use playkey::Settings;

use super::Context;

/// Settings to overwrite; `None` leaves a value untouched.
pub struct Changes {
    pub username: Option<String>,
    pub password: Option<String>,
    pub proxy: Option<String>,
    pub proxy_username: Option<String>,
    pub proxy_password: Option<String>,
}

pub fn cmd_configure(ctx: &Context, changes: Changes) -> Result<()> {
    let mut settings = ctx.settings()?;

    let updates = [
        (KEY_USERNAME, changes.username),
        (KEY_PASSWORD, changes.password),
        (KEY_PROXY_URL, changes.proxy),
        (KEY_PROXY_USERNAME, changes.proxy_username),
        (KEY_PROXY_PASSWORD, changes.proxy_password),
    ];

    let mut changed = 0;
    for (key, value) in updates {
        if let Some(value) = value {
            settings.set_value(key, &value)?;
            changed += 1;
        }
    }

    let credentials = settings.credentials();
    println!("⚙️  Profile: {}", ctx.profile.display());
    println!("   Updated: {changed} setting(s)");
    println!(
        "   Username: {}",
        if credentials.username.is_empty() {
            "[not set]"
        } else {
            credentials.username.as_str()
        }
    );
    println!(
        "   Password: {}",
        if credentials.password.is_empty() {
            "[not set]"
        } else {
            "[present]"
        }
    );
    if let Some(proxy) = settings.proxy() {
        println!("   Proxy: {}", proxy.url);
    }

    Ok(())
}
