//! Seat commands

use anyhow::{bail, Result};

use propel_core::AgentApi;

use crate::session::Session;

/// Fail unless at least one seat is free
pub async fn seats_ensure(session: &Session) -> Result<()> {
    let seats = session.client.seats().await?;
    if seats.n_available < 1 {
        bail!("No seats");
    }
    println!("Seats are ok: {}", seats.n_available);
    Ok(())
}
