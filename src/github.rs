mod client;
mod pagination;
mod rest;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::*;
pub use pagination::*;
pub use rest::*;
pub use types::*;
