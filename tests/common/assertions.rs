//! Event helpers and assertions shared by the scenario tests

use rar_reclaim::Event;
use tokio::sync::broadcast;

/// Drain every event currently buffered on `rx`
pub fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Part numbers from `PartDeleted` events, in order
pub fn deleted_parts(events: &[Event]) -> Vec<u32> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::PartDeleted { part, .. } => Some(*part),
            _ => None,
        })
        .collect()
}
