//! External service integrations.

pub mod extraction_client {
    pub use crate::extraction_client::*;
}

pub mod extraction_models {
    pub use crate::extraction_models::*;
}
