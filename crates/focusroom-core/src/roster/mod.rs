mod sample;
mod simulator;

pub use sample::{Roster, UserFocusSample, MAX_FOCUS_LEVEL};
pub use simulator::BroadcastSimulator;
