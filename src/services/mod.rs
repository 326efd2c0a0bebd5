pub mod normalize; // Webhook reply shape detection
pub mod webhook; // External analysis webhook client

pub use normalize::{normalize, ReplyShape};
pub use webhook::{resolve_webhook_url, WebhookClient};
