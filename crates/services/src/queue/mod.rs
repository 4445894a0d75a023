pub mod connectivity;
pub mod worker;

pub use connectivity::ConnectivityProbe;
pub use worker::QueueWorker;
