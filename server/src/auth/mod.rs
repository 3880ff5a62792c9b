mod crypto;
mod db;
mod extractor;

pub use db::issue_session;
pub use extractor::AuthUser;
