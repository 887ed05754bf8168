//! `PostgreSQL` booking store for the tree-farm booking service.
//!
//! This crate provides [`PostgresBookingStore`], the production implementation
//! of the `BookingStore` trait from `tree-farm-core`. It uses sqlx runtime
//! queries and embedded migrations, and supports:
//!
//! - Conditional counter updates (`count < capacity`, `count > 0`) so the
//!   capacity check and the change happen in a single statement
//! - Transactions pairing each counter change with its booking insert/delete
//! - An atomic claim of the confirmation email state
//!
//! # Example
//!
//! ```no_run
//! use tree_farm_postgres::PostgresBookingStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = sqlx::PgPool::connect("postgres://localhost/tree_farm").await?;
//! let store = PostgresBookingStore::new(pool);
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod booking_store;

pub use booking_store::PostgresBookingStore;
