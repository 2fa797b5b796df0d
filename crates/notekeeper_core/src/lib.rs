pub mod domain;
pub mod error;
pub mod filter;
pub mod memory;
pub mod ports;
pub mod services;
pub mod token;

#[cfg(any(test, feature = "test_utils"))]
pub mod testing;

pub use domain::{normalize_email, AuthSession, NewNote, NewUser, Note, NotePatch, NoteStatus, User};
pub use error::{ServiceError, ServiceResult};
pub use filter::NoteFilter;
pub use memory::InMemoryStore;
pub use ports::{
    ConfirmationMailer, NoteStore, PasswordHasher, PortError, PortResult, SessionStore, UserStore,
};
pub use services::{AccountService, NoteInput, NoteService, Registration, SessionManager};
