use anyhow::Result;

use playkey::{create_license_key, KeyType};

use super::{as_pairs, parse_headers};

pub fn cmd_license_key(
    url: &str,
    key_type: KeyType,
    headers: &[String],
    key_value: Option<&str>,
) -> Result<()> {
    let headers = parse_headers(headers)?;
    let key = create_license_key(url, key_type, &as_pairs(&headers), key_value)?;
    println!("{key}");
    Ok(())
}
