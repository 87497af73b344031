pub mod admin_audit;
pub mod admin_clientes;
pub mod admin_tenants;
pub mod admin_usuarios;
pub mod auth;
pub mod print_jobs;
pub mod qrcode;
pub mod tenant_alimentos;
pub mod tenant_lotes;
pub mod tenant_usuarios;
