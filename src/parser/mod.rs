pub mod notification;

pub use notification::{ParseError, parse_notification};
