use serde::{Deserialize, Serialize};

use crate::model::id_type;

id_type!(
    /// Type-safe identifier for shipping addresses.
    AddressId
);

/// A saved shipping address, as listed by `GET /user/addresses`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    pub city: String,
    pub commune: String,
    pub village: String,
    #[serde(default)]
    pub note: Option<String>,
}
