//! Controller binary: loads the initial grid, drives the run, renders
//! events, and handles operator keypresses.
//!
//! A single `#[tokio::main]` binary that runs three concurrent pieces
//! sharing one `BrokerClient` and one `EventStream`: the `EvolveWorld`
//! submitter, the poller (`controller::run_poller`), and the keypress
//! reader below. Keypresses come from `crossterm::event::EventStream`
//! driven through `tokio_stream::StreamExt`, so a `tokio::select!` can race
//! the next keypress against the evolve call without blocking a thread on
//! synchronous terminal I/O.

#![forbid(unsafe_code)]

use std::env;

use crossterm::event::{Event as TermEvent, EventStream as TermEventStream, KeyCode, KeyEventKind};
use distributed_gol::broker_client::BrokerClient;
use distributed_gol::cli::{parse_string_flag, parse_usize_flag};
use distributed_gol::controller::{handle_keypress, run_poller, KeypressOutcome, StopSignal};
use distributed_gol::events::{run_logging_sink, Event, EventStream, RunState};
use distributed_gol::pgm::{input_filename, load_pgm, output_filename, save_pgm};
use distributed_gol::wire::Params;
use tokio_stream::StreamExt;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env::var("RUST_LOG").unwrap_or_else(|_| "controller=info".into()))
        .with_target(false)
        .compact()
        .init();

    let args: Vec<String> = env::args().collect();
    let width = parse_usize_flag(&args, "--width", 16);
    let height = parse_usize_flag(&args, "--height", 16);
    let turns = parse_usize_flag(&args, "--turns", 100) as u64;
    let threads = parse_usize_flag(&args, "--threads", 1);
    let broker_addr = parse_string_flag(&args, "--broker", "127.0.0.1:8030");
    let input_path = parse_string_flag(
        &args,
        "--input",
        input_filename(width, height).to_str().unwrap_or_default(),
    );

    let world = load_pgm(&input_path).map_err(|e| {
        error!(path = %input_path, error = %e, "failed to load initial grid");
        e
    })?;
    let params = Params { height: world.height, width: world.width, turns, threads };

    let (events, rx) = EventStream::new(1024);
    let sink = tokio::spawn(run_logging_sink(rx));

    let initial_turn: u64 = 0;
    for cell in world.alive_coords() {
        events.send(Event::CellFlipped { turn: initial_turn, cell }).await;
    }
    events.send(Event::TurnComplete { turn: initial_turn }).await;

    let client = BrokerClient::new(&broker_addr);
    let stop = StopSignal::new();
    let poller = tokio::spawn(run_poller(client.clone(), events.clone(), stop.clone()));

    let evolve_client = client.clone();
    let evolve_world = world.clone();
    let mut evolve = tokio::spawn(async move { evolve_client.evolve_world(evolve_world, params).await });

    let mut keys = TermEventStream::new();
    let mut paused = false;
    let mut ended_early: Option<KeypressOutcome> = None;

    loop {
        tokio::select! {
            result = &mut evolve => {
                stop.stop();
                match result {
                    Ok(Ok(resp)) => {
                        finalize_run(&client, &events, resp.turns_completed).await;
                    }
                    Ok(Err(e)) => {
                        error!(error = %e, "EvolveWorld RPC failed; controller exiting");
                        events.send(Event::StateChange { turn: 0, state: RunState::Quitting }).await;
                    }
                    Err(e) => {
                        error!(error = %e, "EvolveWorld task panicked");
                    }
                }
                break;
            }
            Some(key_result) = keys.next() => {
                match key_result {
                    Ok(TermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                        if let Some(c) = keycode_to_char(key.code) {
                            let outcome = handle_keypress(c, &client, &events, params, &mut paused).await;
                            if matches!(outcome, KeypressOutcome::Quit | KeypressOutcome::Kill) {
                                stop.stop();
                                ended_early = Some(outcome);
                                break;
                            }
                        }
                    }
                    Ok(_) => {}
                    Err(e) => warn!(error = %e, "keypress stream error"),
                }
            }
        }
    }

    events.close();
    let _ = poller.await;
    let _ = sink.await;

    if ended_early.is_some() {
        // evolve() is still running against a quitting/killed broker; it
        // will resolve on its own once the broker responds or the
        // connection drops, so we don't await it here.
        info!("controller exiting after operator-initiated shutdown");
    }

    Ok(())
}

async fn finalize_run(client: &BrokerClient, events: &EventStream, turn: u64) {
    match client.calculate_alive_cells().await {
        Ok(resp) => {
            events.send(Event::FinalTurnComplete { turn, cells: resp.cells }).await;
        }
        Err(e) => warn!(error = %e, "CalculateAliveCells failed at run end"),
    }
    match client.get_global().await {
        Ok(resp) => {
            if let Err(e) = save_pgm(output_filename(resp.world.width, resp.world.height, resp.turn), &resp.world) {
                error!(error = %e, "failed to save final PGM snapshot");
            }
        }
        Err(e) => warn!(error = %e, "GetGlobal failed while saving final snapshot"),
    }
    events.send(Event::StateChange { turn, state: RunState::Quitting }).await;
}

fn keycode_to_char(code: KeyCode) -> Option<char> {
    match code {
        KeyCode::Char(c) => Some(c),
        _ => None,
    }
}
