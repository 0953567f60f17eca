//! Page objects
//!
//! A page object borrows the shared [`crate::Utils`] and exposes one method per
//! user-facing interaction of its page. Page objects keep no state of their own.

pub mod login;
pub mod sample;

pub use login::LoginPage;
pub use sample::SamplePage;
