//! Shared domain types for the Aether Router workspace: addresses, opaque
//! ids, decimal amounts, the error taxonomy, and the entities of §3.
//!
//! Kept deliberately free of `sqlx::PgPool`/network dependencies so every
//! other crate (`bridge`, `quoter`, `router`, `auth`, `hub`) can depend on it
//! without pulling in the database driver transitively beyond the type-level
//! `sqlx::Type`/`Encode`/`Decode` impls needed for `repository` to bind these
//! types straight into queries.

pub mod address;
pub mod amount;
pub mod byte_array;
pub mod chain;
pub mod error;
pub mod pool;
pub mod pool_id;
pub mod position;
pub mod route;
pub mod token;
pub mod transaction;
pub mod tx_hash;
pub mod user;

pub use address::Address;
pub use chain::ChainId;
pub use error::Error;
pub use pool::{NewPool, Pool};
pub use pool_id::PoolId;
pub use position::{LiquidityPosition, NewLiquidityPosition};
pub use route::{BridgeProvider, Route, RouteHop};
pub use token::{NewToken, Token};
pub use transaction::{NewTransaction, Transaction, TransactionStatus, TransactionType};
pub use tx_hash::TxHash;
pub use user::User;

pub type Result<T> = std::result::Result<T, Error>;
