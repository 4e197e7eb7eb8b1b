pub mod achievements;
pub mod attendance;
pub mod auto_invite;
pub mod database;
pub mod event_controller;
pub mod notification_queue;
pub mod notifier;
pub mod overall_rating;
pub mod progress;
pub mod rating_controller;
pub mod rating_engine;
pub mod recurrence;
pub mod scheduler_controller;
pub mod training_pool;
