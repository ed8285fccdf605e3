use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind};
use futures::StreamExt;
use tokio::time::{Interval, MissedTickBehavior, interval};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Key(KeyEvent),
    Tick,
    Resize,
}

/// Terminal input merged with a periodic tick, so the loop wakes up to pick
/// up finished requests even when no key is pressed.
pub struct EventHandler {
    events: EventStream,
    tick: Interval,
}

impl EventHandler {
    pub fn new(tick_ms: u64) -> Self {
        let mut tick = interval(Duration::from_millis(tick_ms));
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            events: EventStream::new(),
            tick,
        }
    }

    pub async fn next(&mut self) -> Result<Event> {
        loop {
            tokio::select! {
                _ = self.tick.tick() => return Ok(Event::Tick),
                maybe_event = self.events.next() => {
                    let event = maybe_event
                        .context("Terminal event stream closed")?
                        .context("Failed to read terminal event")?;
                    match event {
                        CrosstermEvent::Key(key) if key.kind != KeyEventKind::Release => {
                            return Ok(Event::Key(key));
                        }
                        CrosstermEvent::Resize(_, _) => return Ok(Event::Resize),
                        _ => {}
                    }
                }
            }
        }
    }
}
