mod health;
mod url;
mod user;

pub use health::ping_handler;
pub use url::{expand_handler, shorten_api_handler, shorten_batch_handler, shorten_text_handler};
pub use user::{delete_user_urls_handler, user_urls_handler};
