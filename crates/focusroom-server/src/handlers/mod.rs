pub mod focus;
pub mod health;
pub mod ws;
