//! IQS7219A inductive proximity sensor with two position-sensing channels.
//!
//! Each channel reports halt, proximity and touch transitions as [`Event`]s
//! and exposes its counts, long-term average, raw counts and variance as
//! [`Readings`]. With the sample trigger enabled, the value picked by the
//! channel's [`Scan`] selector is published through
//! [`EventSink::sample`](crate::EventSink::sample).
//!
//! A dedicated reset line is optional; use [`Iqs7219::with_reset`] to hand
//! one over.
//!
//! [`Event`]: crate::Event

mod parse;
mod regs;
mod report;

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::digital::Wait;
use embedded_hal_async::i2c::{I2c, SevenBitAddress};

use crate::ati::{self, AtiStatus, Calibrate, Calibration, Window};
use crate::config::{ConfigError, PropertySource};
use crate::defs::{NoPin, Version};
use crate::image::{Access, RegisterImage};
use crate::rw::{AddrWidth, CommsMode, Timing, Transport};
use crate::Error;

use regs::*;
pub use regs::Interface;
pub use report::{Readings, Scan};

static TIMING: Timing = Timing {
  settle_us: RDY_SETTLE_US,
  poll_us: 1000,
  comms_timeout_us: COMMS_TIMEOUT_US,
  start_timeout_us: COMMS_TIMEOUT_US,
  max_burst: 64,
  width: AddrWidth::U8,
};

/// Reporting state of one channel.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Channel {
  /// PXS flags that raise events, bit `n` for `PXS_EVENTS[n]`.
  pub(crate) events: u16,
  /// Events are dispatched to the sink.
  pub(crate) enabled: bool,
  pub(crate) scan: Scan,
}

impl Default for Channel {
  fn default() -> Self {
    Self { events: 0, enabled: true, scan: Scan::Delta }
  }
}

/// Last validated status.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Snapshot {
  pub(crate) pxs: u16,
  pub(crate) readings: [Readings; NUM_CHAN],
}

/// IQS7219A driver.
pub struct Iqs7219<I, P, D, R = NoPin> {
  bus: Transport<I, P, D>,
  reset: Option<R>,
  image: RegisterImage<Grp, IMAGE_LEN>,
  version: Version,
  intf: Interface,
  /// Firmware supports holding the comms window open across bursts.
  hold_comms: bool,
  channels: [Channel; NUM_CHAN],
  trigger: bool,
  snapshot: Snapshot,
}

impl<I, P, D> Iqs7219<I, P, D, NoPin> {
  /// Driver without a reset line.
  pub fn new(i2c: I, rdy: P, delay: D, addr: u8) -> Self {
    Self::build(i2c, rdy, None, delay, addr)
  }
}

impl<I, P, D, R> Iqs7219<I, P, D, R> {
  /// Driver that pulses `reset` (active low) before initialization.
  pub fn with_reset(i2c: I, rdy: P, reset: R, delay: D, addr: u8) -> Self {
    Self::build(i2c, rdy, Some(reset), delay, addr)
  }

  fn build(i2c: I, rdy: P, reset: Option<R>, delay: D, addr: u8) -> Self {
    Self {
      bus: Transport::new(i2c, rdy, delay, addr, CommsMode::Forced, &TIMING),
      reset,
      image: RegisterImage::new(&GROUPS),
      version: Version::default(),
      intf: Interface::Event,
      hold_comms: false,
      channels: [Channel::default(); NUM_CHAN],
      trigger: false,
      snapshot: Snapshot::default(),
    }
  }

  pub fn version(&self) -> Version {
    self.version
  }

  /// Interface mode selected by the configuration.
  pub fn interface(&self) -> Interface {
    self.intf
  }

  /// Readings decoded by the last successful [`Iqs7219::service`].
  pub fn readings(&self, ch: usize) -> Option<Readings> {
    self.snapshot.readings.get(ch).copied()
  }

  pub fn event_enabled(&self, ch: usize) -> bool {
    self.channels.get(ch).is_some_and(|c| c.enabled)
  }

  pub fn trigger_enabled(&self) -> bool {
    self.trigger
  }

  pub fn scan(&self, ch: usize) -> Option<Scan> {
    self.channels.get(ch).map(|c| c.scan)
  }

  /// Sampling rate in µHz, derived from the normal-power report rate.
  pub fn sample_rate(&self) -> u64 {
    self.check_power_mode();
    UHZ_PER_MS / u64::from(self.image.word(Grp::Sys, 0, 5).max(1))
  }

  fn check_power_mode(&self) {
    if SysSetup::from_bits(self.image.word(Grp::Sys, 0, 0)).power_mode() == 0 {
      warn!("device is not locked in normal-power mode");
    }
  }

  fn attached<E>(&self) -> Result<(), Error<E>> {
    match self.intf {
      Interface::Standalone => Err(Error::Unsupported),
      _ => Ok(()),
    }
  }

  /// Give the peripherals back.
  pub fn free(self) -> (I, P, D, Option<R>) {
    let (i2c, rdy, delay) = self.bus.release();
    (i2c, rdy, delay, self.reset)
  }
}

/// COMMS_SETUP event mask for the given reporting state.
fn event_mask(channels: &[Channel; NUM_CHAN], trigger: bool) -> u16 {
  channels.iter().filter(|c| trigger || c.enabled).fold(EVENT_MASK_ATI, |mask, c| mask | c.events)
}

impl<I, E, P, D, R> Iqs7219<I, P, D, R>
where
  I: I2c<SevenBitAddress, Error = E>,
  P: InputPin + Wait,
  D: DelayNs,
  R: OutputPin,
{
  /// Reset and identify the device, apply `config` on top of the registers
  /// read back from it, write everything and run ATI.
  ///
  /// In stand-alone mode the device stops talking over I²C once this
  /// returns.
  pub async fn initialize<S>(&mut self, config: &S) -> Result<Calibration, Error<E>>
  where
    S: PropertySource + ?Sized,
  {
    self.hard_reset().await?;

    let mut words = [0u16; 3];
    self.bus.read_words(PROD_NUM, &mut words).await?;
    self.version = Version { product: words[0], major: words[1], minor: words[2], patch: 0 };

    if self.version.product != PROD_NUM_A {
      error!("invalid product number: {}", self.version.product);
      return Err(Error::InvalidProduct(self.version.product));
    }

    self.hold_comms = self.version.at_least(1, 25);

    self.read_all().await?;
    self.parse(config)?;

    let calibration = self.write_all().await?;

    if self.intf == Interface::Standalone {
      info!("entered stand-alone mode");
    }

    Ok(calibration)
  }

  /// Wait for the device to open a communication window on its own.
  pub async fn wait_for_ready(&mut self) -> Result<(), Error<E>> {
    self.attached()?;
    self.bus.wait_for_ready().await
  }

  async fn hard_reset(&mut self) -> Result<(), Error<E>> {
    let Some(reset) = self.reset.as_mut() else {
      return Ok(());
    };

    reset.set_low().map_err(|_| Error::Pin)?;
    self.bus.delay.delay_ms(1).await;
    reset.set_high().map_err(|_| Error::Pin)?;

    if let Err(e) = self.bus.poll_ready(RESET_TIMEOUT_MS * 1000).await {
      error!("failed to reset device");
      return Err(e);
    }

    Ok(())
  }

  /// Replace the event mask and hold bit of COMMS_SETUP with `mask`. Older
  /// firmware has neither.
  async fn write_comms(&mut self, mask: u16) -> Result<(), Error<E>> {
    if !self.hold_comms {
      return Ok(());
    }

    let val = self.bus.read_word(COMMS_SETUP).await?;
    self.bus.write_word(COMMS_SETUP, (val & !(COMMS_HOLD | EVENT_MASK_ALL)) | mask).await
  }

  async fn read_all(&mut self) -> Result<(), Error<E>> {
    // Keep the window open across the group bursts.
    self.write_comms(COMMS_HOLD).await?;
    self.image.sync(&mut self.bus, Access::Read).await?;
    self.write_comms(0).await
  }

  /// Acknowledge the reset, write the whole image back and run ATI.
  pub(crate) async fn write_all(&mut self) -> Result<Calibration, Error<E>> {
    // Acknowledge first in case the device resets again mid-way.
    let setup = SysSetup::from_bits(self.image.word(Grp::Sys, 0, 0)).with_ack_reset(true);
    self.bus.write_word(SYS_SETUP, setup.into_bits()).await?;

    self.write_comms(COMMS_HOLD).await?;
    self.image.sync(&mut self.bus, Access::Write).await?;
    self.write_comms(event_mask(&self.channels, self.trigger)).await?;

    ati::calibrate(self).await
  }

  /// Run ATI again.
  pub async fn calibrate(&mut self) -> Result<Calibration, Error<E>> {
    self.attached()?;
    ati::calibrate(self).await
  }

  /// Change the normal-power report rate to approximate `uhz`.
  pub async fn set_sample_rate(&mut self, uhz: u64) -> Result<(), Error<E>> {
    self.attached()?;

    let rate_ms = UHZ_PER_MS.checked_div(uhz).unwrap_or(u64::MAX);
    if uhz > MAX_RATE_HZ * 1_000_000 || rate_ms > u64::from(MAX_RATE_MS) {
      error!("invalid sample rate: {} uHz", uhz);
      return Err(
        ConfigError::OutOfRange { name: "azoteq,rate-np-ms", value: rate_ms.min(u64::from(u32::MAX)) as u32 }.into(),
      );
    }

    self.check_power_mode();

    self.bus.write_word(SYS_SETUP + 5, rate_ms as u16).await?;
    self.image.set_word(Grp::Sys, 0, 5, rate_ms as u16);

    Ok(())
  }

  /// Start or stop dispatching events of `ch`.
  pub async fn set_event_enable(&mut self, ch: usize, enable: bool) -> Result<(), Error<E>> {
    self.attached()?;

    let mut channels = self.channels;
    channels.get_mut(ch).ok_or(Error::Unsupported)?.enabled = enable;

    self.write_comms(event_mask(&channels, self.trigger)).await?;
    self.channels = channels;

    Ok(())
  }

  /// Select the value published for `ch` while the trigger is enabled.
  pub fn set_scan(&mut self, ch: usize, scan: Scan) -> Result<(), Error<E>> {
    let channel = self.channels.get_mut(ch).ok_or(Error::Unsupported)?;
    channel.scan = scan;
    Ok(())
  }

  /// Start or stop publishing samples.
  pub async fn set_trigger(&mut self, enable: bool) -> Result<(), Error<E>> {
    self.attached()?;

    self.write_comms(event_mask(&self.channels, enable)).await?;
    self.trigger = enable;

    Ok(())
  }
}

impl<I, E, P, D, R> Calibrate<E> for Iqs7219<I, P, D, R>
where
  I: I2c<SevenBitAddress, Error = E>,
  P: InputPin + Wait,
  D: DelayNs,
  R: OutputPin,
{
  async fn request(&mut self) -> Result<(), Error<E>> {
    // Streaming at normal power keeps RDY asserting throughout ATI.
    let setup = SysSetup::from_bits(self.image.word(Grp::Sys, 0, 0))
      .with_intf_mode(Interface::Stream.into_bits())
      .with_power_mode(0)
      .with_redo_ati(true);

    self.bus.write_word(SYS_SETUP, setup.into_bits()).await
  }

  async fn wait(&mut self) -> Result<Window, Error<E>> {
    Window::from_poll(self.bus.poll_ready(COMMS_TIMEOUT_US).await, COMMS_TIMEOUT_US)
  }

  async fn status(&mut self) -> Result<(AtiStatus, u16), Error<E>> {
    let raw = self.bus.read_word(SYS_STATUS).await?;
    let status = SysStatus::from_bits(raw);

    let progress = if status.reset() {
      AtiStatus::Reset
    } else if status.ati_error() {
      AtiStatus::Error
    } else if status.ati_active() {
      AtiStatus::Active
    } else {
      AtiStatus::Done
    };

    Ok((progress, raw))
  }

  async fn restore(&mut self) -> Result<(), Error<E>> {
    let setup = SysSetup::from_bits(self.image.word(Grp::Sys, 0, 0)).with_intf_mode(self.intf.into_bits());
    self.bus.write_word(SYS_SETUP, setup.into_bits()).await
  }
}

#[cfg(test)]
mod tests;
