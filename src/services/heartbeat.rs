//! Race clock heartbeat
//!
//! Logs the running clock once a second after the start, and a waiting
//! message every ten seconds before it.

use std::time::Duration;

use tokio::task::JoinHandle;

use crate::constants::{HEARTBEAT_RUNNING_SECS, HEARTBEAT_WAITING_SECS};
use crate::state::SharedRace;

/// Time to the next tick
pub fn heartbeat_period(started: bool) -> Duration {
    if started {
        Duration::from_secs(HEARTBEAT_RUNNING_SECS)
    } else {
        Duration::from_secs(HEARTBEAT_WAITING_SECS)
    }
}

pub fn spawn_heartbeat(race: SharedRace) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let elapsed = race.read().await.elapsed();
            match elapsed {
                Some(elapsed) => tracing::debug!(clock = %elapsed.clock(), "Race clock"),
                None => tracing::debug!("Waiting for race start"),
            }
            tokio::time::sleep(heartbeat_period(elapsed.is_some())).await;
        }
    })
}
