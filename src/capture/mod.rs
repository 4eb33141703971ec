//! Image-assisted capture: turn a photo of a receipt into a transaction.

mod describe;
mod endpoint;

pub use describe::{CapturedImage, DescriptionClient, parse_described_transaction};
pub use endpoint::capture_transaction_endpoint;
