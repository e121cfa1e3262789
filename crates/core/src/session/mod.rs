#![allow(missing_docs)]

//! Session controller: screens, flows, and notifications.

mod controller;
mod notice;

pub use controller::{
    BorrowForm, LendingSession, PendingSubmission, ReturnDialog, Screen, SessionOptions,
    SubmissionOutcome,
};
pub use notice::{NoticeLevel, Notification};
