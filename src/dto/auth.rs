use serde::{Deserialize, Serialize};

/// JWT claims: `sub` is the principal id, `role` is `customer` or `staff`.
#[derive(Debug, Deserialize, Serialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}
