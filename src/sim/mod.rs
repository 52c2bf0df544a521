pub mod event;
pub mod level;
pub mod push;
pub mod stage;
pub mod step;
pub mod world;
