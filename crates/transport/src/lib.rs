pub mod backend;
mod envelope;
pub mod error;
mod request;

pub use crate::backend::Transport;
pub use crate::envelope::check_envelope;
pub use crate::request::ApiRequest;
use std::sync::Arc;

pub type TransportHandle = Arc<dyn Transport + Send + Sync>;
