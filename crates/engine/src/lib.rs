//! Daily digest pipeline.
//!
//! 1. [`ranking`]: pick the most-upvoted content item
//! 2. [`recipients`]: collect the distinct notifiable addresses
//! 3. [`composer`]: render the digest message
//! 4. [`pipeline`]: run the stages and hand the message to the dispatcher

pub mod composer;
pub mod pipeline;
pub mod ranking;
pub mod recipients;
pub mod store;
