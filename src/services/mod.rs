//! Ad lifecycle workflows: public submission, administrator moderation,
//! the visibility rule, and the session gate in front of moderation.

pub mod admin;
pub mod moderation;
pub mod passwords;
pub mod session;
pub mod submission;
pub mod visibility;
