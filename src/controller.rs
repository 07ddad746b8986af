//! Controller orchestration: the poller (flip/alive-count cadences) and the
//! operator keypress handler.

use crate::broker_client::BrokerClient;
use crate::events::{Event, EventStream, RunState};
use crate::pgm::{output_filename, save_pgm};
use crate::wire::Params;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

/// ~1ms fast cadence for flip polling, 2s slow cadence for alive counts.
pub const FAST_POLL_INTERVAL: Duration = Duration::from_millis(1);
pub const SLOW_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Shared "has the run finished" flag the poller uses to stop itself once
/// `EvolveWorld` returns or a `q`/`k` keypress ends the run early.
#[derive(Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Polls `GetCellFlipped` at the fast cadence and `AliveCellsCount` at the
/// slow cadence, forwarding both onto `events`, until `stop` is set.
///
/// A single `tokio::time::interval` pair driven by `tokio::select!` keeps
/// both cadences live without spawning a task per cadence.
pub async fn run_poller(client: BrokerClient, events: EventStream, stop: StopSignal) {
    let mut fast = tokio::time::interval(FAST_POLL_INTERVAL);
    let mut slow = tokio::time::interval(SLOW_POLL_INTERVAL);

    while !stop.is_stopped() {
        tokio::select! {
            _ = fast.tick() => {
                match client.get_cell_flipped().await {
                    Ok(resp) if !resp.events.is_empty() => {
                        let mut last_turn = 0;
                        for ev in resp.events {
                            last_turn = last_turn.max(ev.turn);
                            events.send(Event::CellFlipped { turn: ev.turn, cell: ev.cell }).await;
                        }
                        events.send(Event::TurnComplete { turn: last_turn }).await;
                    }
                    Ok(_) => {}
                    Err(e) => warn!(error = %e, "flip poll failed"),
                }
            }
            _ = slow.tick() => {
                match client.alive_cells_count().await {
                    Ok(resp) => {
                        events.send(Event::AliveCellsCount { turn: resp.turn, count: resp.count }).await;
                    }
                    Err(e) => warn!(error = %e, "alive-count poll failed"),
                }
            }
        }
    }
}

/// Operator keypress outcomes the main loop cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeypressOutcome {
    Continue,
    Quit,
    Kill,
}

/// Handles one operator keypress. `paused` tracks whether we're mid-`p`
/// (waiting for the matching resume), since `p` toggles across two
/// separate calls to this function.
pub async fn handle_keypress(
    key: char,
    client: &BrokerClient,
    events: &EventStream,
    params: Params,
    paused: &mut bool,
) -> KeypressOutcome {
    match key {
        's' => {
            match client.get_global().await {
                Ok(resp) => {
                    if let Err(e) = save_pgm(output_filename(params.width, params.height, resp.turn), &resp.world)
                    {
                        error!(error = %e, "failed to save PGM snapshot");
                    }
                    events.send(Event::StateChange { turn: resp.turn, state: RunState::Executing }).await;
                }
                Err(e) => warn!(error = %e, "GetGlobal failed on 's'"),
            }
            KeypressOutcome::Continue
        }
        'q' => {
            if let Err(e) = client.quit_server().await {
                warn!(error = %e, "QuitServer call failed");
            }
            finish_with_snapshot(client, events, params, RunState::Quitting).await;
            KeypressOutcome::Quit
        }
        'k' => {
            if let Err(e) = client.kill_server().await {
                warn!(error = %e, "KillServer call failed (broker may already be gone)");
            }
            finish_with_snapshot(client, events, params, RunState::Quitting).await;
            KeypressOutcome::Kill
        }
        'p' => {
            if !*paused {
                events.send(Event::StateChange { turn: 0, state: RunState::Paused }).await;
                if let Err(e) = client.pause().await {
                    warn!(error = %e, "Pause call failed");
                }
                *paused = true;
            } else {
                if let Err(e) = client.unpause().await {
                    warn!(error = %e, "Unpause call failed");
                }
                events.send(Event::StateChange { turn: 0, state: RunState::Executing }).await;
                *paused = false;
            }
            KeypressOutcome::Continue
        }
        _ => KeypressOutcome::Continue,
    }
}

/// Shared tail of `q`/`k`, run *after* the broker has already quit/killed:
/// fetch the (now zeroed, per `QuitServer`'s reset) world, save it, emit
/// StateChange.
async fn finish_with_snapshot(client: &BrokerClient, events: &EventStream, params: Params, state: RunState) {
    match client.get_global().await {
        Ok(resp) => {
            if let Err(e) = save_pgm(output_filename(params.width, params.height, resp.turn), &resp.world) {
                error!(error = %e, "failed to save PGM snapshot");
            }
            events.send(Event::StateChange { turn: resp.turn, state }).await;
        }
        Err(e) => {
            warn!(error = %e, "GetGlobal failed during shutdown snapshot");
            events.send(Event::StateChange { turn: 0, state }).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::Params;

    #[test]
    fn stop_signal_starts_clear_and_latches_once_set() {
        let stop = StopSignal::new();
        assert!(!stop.is_stopped());
        stop.stop();
        assert!(stop.is_stopped());
    }

    #[tokio::test]
    async fn unknown_keypress_is_ignored_without_touching_the_broker() {
        // An unreachable address: if handle_keypress tried an RPC here the
        // test would hang or error, so reaching `Continue` proves it didn't.
        let client = BrokerClient::new("127.0.0.1:1");
        let (events, _rx) = EventStream::new(4);
        let params = Params { height: 4, width: 4, turns: 1, threads: 1 };
        let mut paused = false;
        let outcome = handle_keypress('z', &client, &events, params, &mut paused).await;
        assert_eq!(outcome, KeypressOutcome::Continue);
        assert!(!paused);
    }
}
