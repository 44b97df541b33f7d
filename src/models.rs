pub mod jwt;
pub mod refresh_token;
pub mod user;

use chrono::{DateTime, Utc};
use mongodb::bson::DateTime as BsonDateTime;

use crate::store::StoreError;

pub(crate) fn chrono_to_bson(dt: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(dt.timestamp_millis())
}

pub(crate) fn bson_to_chrono(dt: BsonDateTime) -> Result<DateTime<Utc>, StoreError> {
    DateTime::<Utc>::from_timestamp_millis(dt.timestamp_millis())
        .ok_or_else(|| StoreError::Backend(format!("timestamp out of range: {dt}")))
}
