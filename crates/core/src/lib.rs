pub mod control;
pub mod detection;
pub mod drone;
pub mod pipeline;
pub mod shared;
pub mod video;
