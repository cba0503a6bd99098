//! Listener adaptor synthesis and the runtime half of its `fire` protocol

pub mod boxing;
pub mod dispatch;
pub mod error;
pub mod generator;

pub use dispatch::EventBinding;
pub use error::{SynthesisError, SynthesisResult, SynthesisWarning};
pub use generator::{AdaptorMethod, EventAdaptorSynthesizer, StubKind, SynthesizedAdaptor};
