pub mod achievements;
pub mod attributes;
pub mod events;
pub mod health;
pub mod notifications;
pub mod progress;
pub mod training_pools;
pub mod training_templates;
