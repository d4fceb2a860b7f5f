//! Logic shared by several handlers.

pub mod checkout;
