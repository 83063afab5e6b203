#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Async, `no_std` drivers for the Azoteq IQS323, IQS7219 and IQS9150/IQS9151
//! capacitive and inductive sensing controllers.
//!
//! All three products share one communication and configuration engine:
//!
//! - RDY-gated register access with forced communication windows, the
//!   `0xEEEE` not-ready sentinel and bounded retries
//! - An in-memory image of every configuration register group, read from
//!   the device, patched from a property tree and written back
//! - Static property descriptor tables using the vendor binding names
//!   (`azoteq,thresh`, `channel-0`, `event-touch`, ...)
//! - ATI (automatic tuning) sequencing with retry and timeout
//! - Status decoding into edge-triggered [`Event`]s delivered to an
//!   [`EventSink`]
//!
//! Bus, pins and time come from the `embedded-hal` / `embedded-hal-async`
//! 1.0 traits. Logging goes through `defmt` when the `defmt` feature is on.
//!
//! ```no_run
//! use azoteq_iqs::{Event, EventSink, Iqs323, Node, Value};
//! use embedded_hal::digital::{InputPin, OutputPin};
//! use embedded_hal_async::{delay::DelayNs, digital::Wait, i2c::{I2c, SevenBitAddress}};
//!
//! struct Log;
//!
//! impl EventSink for Log {
//!   fn event(&mut self, _event: Event) {}
//! }
//!
//! const TOUCH: [Node; 1] = [Node::new("event-touch").with_props(&[("azoteq,thresh", Value::U32(20))])];
//! const CHANNELS: [Node; 1] = [Node::new("channel-0").with_children(&TOUCH)];
//! const CONFIG: Node = Node::new("iqs323").with_children(&CHANNELS);
//!
//! async fn example<I, P, D, E>(i2c: I, rdy: P, delay: D) -> Result<(), azoteq_iqs::Error<E>>
//! where
//!   I: I2c<SevenBitAddress, Error = E>,
//!   P: InputPin + OutputPin + Wait,
//!   D: DelayNs,
//! {
//!   let mut dev = Iqs323::new(i2c, rdy, delay, 0x44);
//!   dev.initialize(&CONFIG).await?;
//!
//!   loop {
//!     dev.wait_for_ready().await?;
//!     dev.service(0, &mut Log).await?;
//!   }
//! }
//! ```

#[cfg(test)]
extern crate std;

#[macro_use]
mod fmt;

mod ati;
mod config;
mod defs;
mod event;
mod image;
mod rw;
#[cfg(test)]
mod testing;

pub mod iqs323;
pub mod iqs7219;
pub mod iqs9150;

pub use ati::Calibration;
pub use config::{ConfigError, Node, PropertyError, PropertySource, Value};
pub use defs::{NoPin, Version};
pub use event::{
  Contact, Edge, Event, EventKind, EventSink, Gesture, Outcome, Recovery, SliderGesture, Source, SwipeDirection,
  TapCount,
};
pub use iqs323::Iqs323;
pub use iqs7219::Iqs7219;
pub use iqs9150::Iqs9150;
pub use rw::CommsMode;

/// Errors that can occur while interacting with a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
  /// I²C bus transaction failed with the underlying driver error.
  I2c(E),
  /// Reading or driving the RDY or reset line failed.
  Pin,
  /// The device kept answering with the not-ready sentinel, or a read
  /// needed a recovery first and should be repeated.
  NotReady,
  /// RDY did not assert in time.
  Timeout,
  /// ATI kept reporting an error; carries the last status word.
  AtiFailed(u16),
  /// ATI was still running when the last attempt's budget ran out.
  AtiTimeout,
  /// The device reported an unexpected product number.
  InvalidProduct(u16),
  /// The supplied configuration was rejected.
  Config(ConfigError),
  /// A transfer did not fit the driver's buffers.
  BufferOverflow,
  /// The firmware or product lacks the requested feature.
  Unsupported,
}

impl<E> From<ConfigError> for Error<E> {
  fn from(e: ConfigError) -> Self {
    Error::Config(e)
  }
}
