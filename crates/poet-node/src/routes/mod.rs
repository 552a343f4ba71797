pub mod health;
pub mod thoughts;
