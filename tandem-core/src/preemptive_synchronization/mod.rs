pub mod cancellation_token;
pub mod start_gate;

pub use cancellation_token::CancellationToken;
pub use start_gate::StartGate;
