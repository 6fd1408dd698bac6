//! Mock backend control channel

mod client;

pub use client::{MockApi, MockClient, MockReply};
