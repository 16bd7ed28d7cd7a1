// Pure pipeline stages and shared errors
pub mod normalizer {
    pub use crate::normalizer::*;
}

pub mod reconciliation {
    pub use crate::reconciliation::*;
}

pub mod presentation {
    pub use crate::presentation::*;
}

pub mod errors {
    pub use crate::errors::*;
}
