//! Glue between the low-level capture/VAD/injection crates and the
//! `voxflow-core` contracts the Flow Supervisor programs against. Nothing
//! in here implements dictation logic — it only adapts shapes.

pub mod capture;
pub mod handlers;
#[cfg(feature = "text-injection")]
pub mod injector;
