//! The broker's authoritative state: the world, the turn counter, the
//! flip-delta snapshot, and the pause/quit/kill control flags.
//!
//! This module is deliberately decoupled from axum — it exposes plain
//! async methods that `broker_service.rs` wraps in HTTP handlers, so the
//! concurrency discipline can be unit-tested without a socket.

use crate::wire::{stripe_assignment, Cell, EvaluateStripeRequest, EvaluateStripeResponse, Params, World};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("no workers are registered; EvolveWorld cannot proceed")]
    NoWorkers,
    #[error("worker {addr} request failed: {source}")]
    WorkerTransport { addr: String, source: reqwest::Error },
    #[error("worker {addr} returned HTTP {status}")]
    WorkerStatus { addr: String, status: reqwest::StatusCode },
    #[error("worker task panicked: {0}")]
    WorkerJoin(String),
}

struct WorldGuts {
    world: World,
    prev_world: World,
    turn: u64,
    turn_done: bool,
}

/// Run-control state visible to operators: idle, running, paused, or
/// winding down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Paused,
    Quitting,
}

pub struct BrokerState {
    guts: Mutex<WorldGuts>,
    paused: AtomicBool,
    pause_notify: Notify,
    quit: AtomicBool,
    workers: Vec<String>,
    http: reqwest::Client,
    run_state: StdMutex<RunState>,
}

impl BrokerState {
    pub fn new(workers: Vec<String>) -> Arc<Self> {
        Arc::new(Self {
            guts: Mutex::new(WorldGuts {
                world: World::new_dead(0, 0),
                prev_world: World::new_dead(0, 0),
                turn: 0,
                turn_done: false,
            }),
            paused: AtomicBool::new(false),
            pause_notify: Notify::new(),
            quit: AtomicBool::new(false),
            workers,
            http: reqwest::Client::new(),
            run_state: StdMutex::new(RunState::Idle),
        })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn run_state(&self) -> RunState {
        *self.run_state.lock().expect("run state mutex poisoned")
    }

    fn set_run_state(&self, state: RunState) {
        *self.run_state.lock().expect("run state mutex poisoned") = state;
    }

    /// Blocks while `Pause` has been called, without holding the world
    /// mutex. An `AtomicBool` + `Notify` pair rather than a mutex acquired
    /// in one RPC and released by a later, independent one — that pattern
    /// only works if the runtime happens to dispatch both calls on the
    /// same thread, which axum does not guarantee.
    async fn wait_while_paused(&self) {
        loop {
            if !self.paused.load(Ordering::Acquire) {
                return;
            }
            // Register interest *before* rechecking the flag, so a
            // concurrent Unpause can't notify between our check and our
            // wait and get lost.
            let notified = self.pause_notify.notified();
            if self.paused.load(Ordering::Acquire) {
                notified.await;
            }
        }
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
        self.set_run_state(RunState::Paused);
        info!("broker paused");
    }

    pub fn unpause(&self) {
        self.paused.store(false, Ordering::Release);
        self.pause_notify.notify_waiters();
        self.set_run_state(RunState::Running);
        info!("broker unpaused");
    }

    /// `EvolveWorld`: copies `initial` into W, zeroes T, clears Quit, then
    /// runs turns until `params.turns` is reached or Quit is observed.
    pub async fn evolve_world(&self, initial: World, params: Params) -> Result<(World, u64), BrokerError> {
        {
            let mut guts = self.guts.lock().await;
            guts.world = initial;
            guts.prev_world = guts.world.clone();
            guts.turn = 0;
            guts.turn_done = false;
        }
        self.quit.store(false, Ordering::Release);
        self.set_run_state(RunState::Running);

        loop {
            let turn_now = self.guts.lock().await.turn;
            if turn_now >= params.turns || self.quit.load(Ordering::Acquire) {
                break;
            }
            self.wait_while_paused().await;
            self.run_one_turn().await?;
        }

        self.set_run_state(RunState::Idle);
        let guts = self.guts.lock().await;
        Ok((guts.world.clone(), guts.turn))
    }

    /// One distributed turn: fan out to every worker, collect stripes in
    /// worker-id order, replace W, advance T. Holds the world mutex for the
    /// whole turn, so observer RPCs never see a half-assembled world.
    async fn run_one_turn(&self) -> Result<(), BrokerError> {
        let n = self.workers.len();
        if n == 0 {
            return Err(BrokerError::NoWorkers);
        }

        let mut guts = self.guts.lock().await;
        let height = guts.world.height;
        let width = guts.world.width;

        let mut tasks = Vec::with_capacity(n);
        for (id, addr) in self.workers.iter().enumerate() {
            let assignment = stripe_assignment(height, n, id);
            let client = self.http.clone();
            let addr = addr.clone();
            let world = guts.world.clone();
            tasks.push(tokio::spawn(async move {
                call_evaluate_stripe(&client, &addr, world, assignment.start_row, assignment.end_row).await
            }));
        }

        let mut new_cells = Vec::with_capacity(height * width);
        for (id, task) in tasks.into_iter().enumerate() {
            let stripe = task
                .await
                .map_err(|e| BrokerError::WorkerJoin(e.to_string()))??;
            debug!(worker_id = id, rows = stripe.len() / width.max(1), "stripe received");
            new_cells.extend(stripe);
        }

        guts.world = World { height, width, cells: new_cells };
        guts.turn += 1;
        guts.turn_done = true;
        Ok(())
    }

    pub async fn alive_cells_count(&self) -> (usize, u64) {
        self.wait_while_paused().await;
        let guts = self.guts.lock().await;
        (guts.world.alive_count(), guts.turn)
    }

    pub async fn calculate_alive_cells(&self) -> Vec<Cell> {
        self.wait_while_paused().await;
        let guts = self.guts.lock().await;
        guts.world.alive_coords()
    }

    pub async fn get_global(&self) -> (World, u64) {
        self.wait_while_paused().await;
        let guts = self.guts.lock().await;
        (guts.world.clone(), guts.turn)
    }

    pub async fn get_turn_done(&self) -> (bool, u64) {
        self.wait_while_paused().await;
        let mut guts = self.guts.lock().await;
        let flag = guts.turn_done;
        guts.turn_done = false;
        (flag, guts.turn)
    }

    /// XORs W against the last-read snapshot, returns every differing
    /// coordinate, then replaces the snapshot. Empty grids yield an empty
    /// list rather than an error.
    pub async fn get_cell_flipped(&self) -> Vec<(u64, Cell)> {
        self.wait_while_paused().await;
        let mut guts = self.guts.lock().await;
        if guts.world.cells.is_empty() || guts.prev_world.cells.is_empty() {
            guts.prev_world = guts.world.clone();
            return Vec::new();
        }
        let turn = guts.turn;
        let mut events = Vec::new();
        for y in 0..guts.world.height {
            for x in 0..guts.world.width {
                if guts.world.get(y, x) != guts.prev_world.get(y, x) {
                    events.push((turn, Cell { x, y }));
                }
            }
        }
        guts.prev_world = guts.world.clone();
        events
    }

    /// `QuitServer`: sets Quit, zeroes W (keeping its size), resets T.
    pub async fn quit_server(&self) {
        let mut guts = self.guts.lock().await;
        let (h, w) = (guts.world.height, guts.world.width);
        guts.world = World::new_dead(h, w);
        guts.prev_world = World::new_dead(h, w);
        guts.turn = 0;
        guts.turn_done = false;
        self.quit.store(true, Ordering::Release);
        self.set_run_state(RunState::Quitting);
        info!("broker received QuitServer");
    }

    /// `KillServer`: best-effort Kill to every worker, sets Quit, and
    /// schedules process exit. The caller is expected to send its HTTP
    /// response before the process actually exits (see `broker_service`).
    pub async fn kill_server(self: &Arc<Self>) {
        self.quit.store(true, Ordering::Release);
        self.set_run_state(RunState::Quitting);
        for addr in &self.workers {
            let url = format!("http://{addr}/kill");
            if let Err(e) = self.http.post(&url).send().await {
                warn!(addr, error = %e, "failed to deliver Kill to worker");
            }
        }
        info!("broker received KillServer; exiting after response flush");
    }
}

async fn call_evaluate_stripe(
    client: &reqwest::Client,
    addr: &str,
    world: World,
    start_row: usize,
    end_row: usize,
) -> Result<Vec<u8>, BrokerError> {
    let url = format!("http://{addr}/evaluate-stripe");
    let req = EvaluateStripeRequest { world, start_row, end_row };
    let resp = client
        .post(&url)
        .json(&req)
        .timeout(Duration::from_secs(30))
        .send()
        .await
        .map_err(|e| BrokerError::WorkerTransport { addr: addr.to_string(), source: e })?;

    if !resp.status().is_success() {
        return Err(BrokerError::WorkerStatus { addr: addr.to_string(), status: resp.status() });
    }
    let body: EvaluateStripeResponse = resp
        .json()
        .await
        .map_err(|e| BrokerError::WorkerTransport { addr: addr.to_string(), source: e })?;
    Ok(body.stripe)
}
