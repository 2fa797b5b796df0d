pub mod account;
pub mod notes;
pub mod session;

pub use account::{AccountService, Registration};
pub use notes::{NoteInput, NoteService};
pub use session::SessionManager;
