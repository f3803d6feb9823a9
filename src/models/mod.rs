mod client;
mod field;

pub use client::{
    ACTIVE_NOT_BOOLEAN_MESSAGE, Client, ClientFields, ClientListing, ClientPatch, ClientSummary,
    EMPTY_REQUIRED_MESSAGE, INVALID_PAYLOAD_MESSAGE, MISSING_REQUIRED_MESSAGE, NewClient,
};
pub use field::Field;
