pub mod db;
pub mod mailer;
pub mod password;

pub use db::DbAdapter;
pub use mailer::FileMailer;
pub use password::Argon2Hasher;
