//! Route tables, one module per API prefix.

pub mod rag;
pub mod restaurants;
pub mod structured;
