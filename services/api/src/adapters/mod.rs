pub mod db;
pub mod hasher;
pub mod jwt;
pub mod memory;

pub use db::PgStore;
pub use hasher::Argon2Hasher;
pub use jwt::JwtTokenService;
pub use memory::MemoryStore;
