//! Route handlers

pub mod events;
pub mod health;
pub mod ui;
pub mod version;
pub mod ws;
