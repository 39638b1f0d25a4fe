//! Variable commands

use anyhow::Result;

use propel_core::types::{NewVariable, VarType};
use propel_core::AgentApi;

use crate::output::print_json;
use crate::session::Session;

pub async fn variables_list(session: &Session) -> Result<()> {
    let variables = session.client.variables_list().await?;
    print_json(&variables)?;
    Ok(())
}

pub async fn variables_create(
    session: &Session,
    name: &str,
    key: &str,
    value: &str,
    var_type: VarType,
) -> Result<()> {
    let variable = NewVariable::new(name, key, value).with_type(var_type);
    let created = session.client.variables_create(&variable).await?;
    print_json(&created)?;
    Ok(())
}
