pub mod inventory;
pub mod outline;
pub mod rank;
