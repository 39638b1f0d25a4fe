//! API key commands

use anyhow::Result;

use crate::output::print_json;
use crate::session::Session;

pub async fn keys_list(session: &Session) -> Result<()> {
    let keys = session.client.keys_list().await?;
    print_json(&keys)?;
    Ok(())
}

pub async fn keys_create(session: &Session) -> Result<()> {
    let key = session.client.keys_create().await?;
    print_json(&key)?;
    Ok(())
}
