pub mod ask;
pub mod drugs;
pub mod health;
