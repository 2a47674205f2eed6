//! Domain logic and core data structures
//!
//! This module contains pure menu logic that is independent of any
//! display system, shortcut facility or power backend.

pub mod accelerator;
pub mod action;
pub mod grid;
pub mod keyboard;
