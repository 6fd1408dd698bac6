//! JSON-RPC access to the framework under test
//!
//! Requests go out as curl command lines; responses come back as raw text
//! so they can be compared byte for byte with the expected literals.

pub mod request;
pub mod runner;

pub use request::{curl_command, RpcRequest};
pub use runner::{extract_response, CommandRunner, Observed, NO_RESPONSE};
