//! Domain Models - Entities and Value Objects

pub mod action;
pub mod agent;
pub mod event;
pub mod outcome;
pub mod phase;
pub mod role;
pub mod rules;
pub mod state;
pub mod view;
pub mod vote;
