//! Outbound delivery of the daily digest.
//!
//! - [`mailer`]: the mail transport port and its Resend HTTP adapter
//! - [`dispatch`]: per-recipient delivery with failure isolation

pub mod dispatch;
pub mod mailer;
