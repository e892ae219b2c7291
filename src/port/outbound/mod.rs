//! Outbound ports: what the core needs from the outside world.

pub mod broadcast;
pub mod reference;
pub mod volatile;
