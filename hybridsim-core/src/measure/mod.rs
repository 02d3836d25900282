mod data_rate;
mod delay;

pub use self::{data_rate::DataRate, delay::Delay};
