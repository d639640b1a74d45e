pub mod progress;
pub mod reads;
