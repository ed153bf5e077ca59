mod manager;

pub use manager::{DeviceState, SharedState};
