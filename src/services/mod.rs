pub mod detection;
pub mod engine;
pub mod notifier;
pub mod registry;
pub mod valuation;

pub use detection::{run_detection_loop, DetectionReport};
pub use engine::{PassError, SignalEngine};
pub use notifier::{NotificationSink, TelegramNotifier};
pub use registry::RegistryError;
pub use valuation::{run_valuation_loop, ValuationReport};
