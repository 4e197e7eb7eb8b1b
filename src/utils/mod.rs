pub mod database_utils;
pub mod startup_utils;
