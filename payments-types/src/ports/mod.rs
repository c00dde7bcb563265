//! Port traits (interfaces for adapters).
//!
//! These are the contracts that adapters must implement.
//! The application layer depends on these traits, not concrete implementations.

mod authority;
mod directory;
mod gateway;
mod repository;

pub use authority::AuthorityService;
pub use directory::UserDirectory;
pub use gateway::PaymentGateway;
pub use repository::PaymentRepository;
