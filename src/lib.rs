//! Client library for a kanban task board backed by a REST API.
//!
//! The board state lives in [`board::Board`] and is only changed through
//! [`drag::BoardController`], which applies drags optimistically and settles
//! them against the server through a [`api::TaskApi`].

pub mod api;
pub mod board;
pub mod commands;
pub mod config;
pub mod drag;
pub mod error;
pub mod logging;
pub mod models;
pub mod tui;
pub mod validation;
