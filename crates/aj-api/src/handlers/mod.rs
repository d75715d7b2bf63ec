pub mod health;
pub mod matches;
