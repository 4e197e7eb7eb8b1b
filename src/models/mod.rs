pub mod achievement;
pub mod attribute;
pub mod event;
pub mod notification;
pub mod player;
pub mod progress;
pub mod template;
pub mod training_pool;
