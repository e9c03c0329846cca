//! Retry policy and the retrying invoker.

mod invoker;
mod policy;

pub use invoker::{ClientIdExtractor, RetryingInvoker};
pub use policy::{parse_retry_after, RetryPolicy};
