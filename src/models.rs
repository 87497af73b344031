pub mod audit;
pub mod auth;
pub mod inventory;
pub mod lote;
pub mod tenancy;
