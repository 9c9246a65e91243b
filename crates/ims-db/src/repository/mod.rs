//! # Repository Module
//!
//! The three stores the reconciler works against.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ProductRepository     products + product_sizes                        │
//! │  SaleRepository        sales + sale_sizes                              │
//! │  ReturnRepository      returns (append-only)                           │
//! │                                                                         │
//! │  Pool methods (&self)            one-shot reads and writes             │
//! │  *_in(&mut SqliteConnection)     same SQL, inside a caller's tx        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stores hand out owned snapshots. Nothing is written back implicitly; a
//! changed snapshot goes back through `save`.

pub mod product;
pub mod returns;
pub mod sale;
mod stock;

pub use product::ProductRepository;
pub use returns::ReturnRepository;
pub use sale::SaleRepository;
