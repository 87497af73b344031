pub mod access;
pub mod audit;
pub mod auth;
pub mod etiqueta_service;
pub mod history_cleanup;
pub mod inventory_service;
pub mod lote_service;
pub mod rate_limit;
