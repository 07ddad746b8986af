//! Distributed Conway's Game of Life: a broker/worker/controller pipeline.
//!
//! - [`wire`] is the shared schema every RPC payload is built from.
//! - [`life`] is the pure Life rule the worker evaluates and the broker
//!   uses as its single-worker reference for distribution-correctness
//!   tests.
//! - [`broker_state`] / [`broker_service`] are the broker's state machine
//!   and its axum HTTP surface.
//! - [`worker_service`] is the worker's axum HTTP surface.
//! - [`broker_client`] / [`controller`] are the controller's RPC client and
//!   its poller/keypress orchestration.
//! - [`discovery`], [`pgm`], [`cli`], [`events`] are the external
//!   collaborators: the worker discovery file, PGM snapshot I/O, CLI flag
//!   parsing, and the outbound event stream.

pub mod broker_client;
pub mod broker_service;
pub mod broker_state;
pub mod cli;
pub mod controller;
pub mod discovery;
pub mod events;
pub mod life;
pub mod pgm;
pub mod wire;
pub mod worker_service;
