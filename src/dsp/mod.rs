pub mod frames;
pub mod pauses;
pub mod pitch;
pub mod tempo;
pub mod windowing;
