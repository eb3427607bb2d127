pub mod event_grant;

pub use event_grant::EventGrant;
