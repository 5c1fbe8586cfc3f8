//! Synchronization and Concurrency Support
//!
//! - **Primitives** (`primitives`): [`CriticalSectionCell`], ISR-safe interior
//!   mutability
//! - **Completion** (`completion`): [`Completion`], the level-triggered event
//!   a descriptor callback satisfies and the engine waits on with a bound
//! - **Trigger** (`trigger`): [`TriggerQueue`], the operator-facing request
//!   counter that serializes test runs
//!
//! # Example
//!
//! ```ignore
//! use axidma_tester::sync::TriggerQueue;
//!
//! static TRIGGER: TriggerQueue = TriggerQueue::new();
//!
//! // operator surface (sysfs attribute, shell command, button ISR ...)
//! TRIGGER.trigger();
//!
//! // owning context
//! tester.service(&TRIGGER);
//! ```

mod completion;
mod primitives;
mod trigger;

pub use completion::Completion;
pub use primitives::CriticalSectionCell;
pub use trigger::TriggerQueue;
