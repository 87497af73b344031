pub mod user_repo;
pub use user_repo::UserRepository;
pub mod tenancy_repo;
pub use tenancy_repo::TenancyRepository;
pub mod inventory_repo;
pub use inventory_repo::InventoryRepository;
pub mod lote_repo;
pub use lote_repo::LoteRepository;
pub mod audit_repo;
pub use audit_repo::AuditRepository;
