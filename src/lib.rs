//! # Connect Four Engine
//!
//! A Connect Four game-tree engine: board state with apply/undo, win
//! detection, a family of move strategies (random, fixed pattern, minimax,
//! iterative-deepening alpha-beta, Monte Carlo rollouts, interactive), and a
//! turn engine that runs them under per-move time budgets.
//!
//! ## Modules
//!
//! - [`game`] — Core game logic: board, player, win detection, results
//! - [`ai`] — Strategy trait, search context, heuristic, every strategy
//! - [`engine`] — Turn state machine, deadline worker, fallback policy
//! - [`arena`] — Multi-game series between two strategies
//! - [`config`] — TOML configuration loading and validation
//! - [`error`] — Structured error types

pub mod ai;
pub mod arena;
pub mod config;
pub mod engine;
pub mod error;
pub mod game;
