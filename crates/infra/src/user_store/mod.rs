//! Read access to user accounts and their role graph.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryUserStore;
pub use postgres::PostgresUserStore;
pub use r#trait::UserStore;
