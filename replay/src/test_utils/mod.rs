//! Helpers for tests that build streams of events.

pub mod event;
