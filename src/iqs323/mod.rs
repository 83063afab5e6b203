//! IQS323 three-channel capacitive/inductive controller.
//!
//! Both the REL (release detection) and MOV (movement detection) firmware
//! variants are supported; the variant is picked from the product number
//! read during [`Iqs323::initialize`].
//!
//! The RDY line doubles as MCLR, so the pin handed to the driver must be
//! usable as an open-drain output as well as an input.

mod parse;
mod regs;
mod report;

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::digital::Wait;
use embedded_hal_async::i2c::{I2c, SevenBitAddress};

use crate::ati::{self, AtiStatus, Calibrate, Calibration, Window, ATI_TIMEOUT_US};
use crate::config::PropertySource;
use crate::defs::Version;
use crate::event::Discard;
use crate::image::{Access, RegisterImage};
use crate::rw::{AddrWidth, CommsMode, Timing, Transport, COMMS_ERROR, COMMS_RETRY_MS, NUM_RETRIES};
use crate::Error;

use regs::*;
pub use report::{ChannelInfo, MotionInfo};

static TIMING: Timing = Timing {
  settle_us: RDY_SETTLE_US,
  poll_us: 100,
  comms_timeout_us: COMMS_TIMEOUT_US,
  start_timeout_us: COMMS_TIMEOUT_US,
  max_burst: 64,
  width: AddrWidth::U8,
};

/// Firmware variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Variant {
  /// Release detection, product number 1106.
  Release,
  /// Movement detection, product number 1462.
  Movement,
}

/// How the device opens communication windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum Interface {
  /// The last mode switch failed; the device state is unknown.
  Error,
  Event,
  Stream,
}

/// Configured outputs, recorded while parsing.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Events {
  /// SYS_STATUS bits of every configured channel event.
  pub(crate) keys: u16,
  /// One bit per configured slider gesture, in status-bit order.
  pub(crate) slider: u8,
  /// Report the slider coordinate while touched.
  pub(crate) position: bool,
  /// SYS_STATUS bits that make up the wear status.
  pub(crate) wear: u16,
}

/// Last validated status, the baseline for edge detection.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Snapshot {
  pub(crate) status: u16,
  pub(crate) slider: u16,
  pub(crate) pressed: bool,
}

/// IQS323 driver.
pub struct Iqs323<I, P, D> {
  bus: Transport<I, P, D>,
  image: RegisterImage<Grp, IMAGE_LEN>,
  desc: &'static Desc,
  version: Version,
  intf: Interface,
  events: Events,
  snapshot: Snapshot,
}

impl<I, P, D> Iqs323<I, P, D> {
  /// Wrap the bus, the shared RDY/MCLR line and a delay source. Nothing is
  /// sent until [`Iqs323::initialize`].
  pub fn new(i2c: I, rdy: P, delay: D, addr: u8) -> Self {
    let desc = &DEVS[0];

    Self {
      bus: Transport::new(i2c, rdy, delay, addr, CommsMode::Forced, &TIMING),
      image: RegisterImage::new(desc.groups),
      desc,
      version: Version::default(),
      intf: Interface::Error,
      events: Events::default(),
      snapshot: Snapshot::default(),
    }
  }

  /// Firmware version read during initialization.
  pub fn version(&self) -> Version {
    self.version
  }

  pub fn variant(&self) -> Variant {
    if self.desc.is_mov() {
      Variant::Movement
    } else {
      Variant::Release
    }
  }

  /// Give the peripherals back.
  pub fn free(self) -> (I, P, D) {
    self.bus.release()
  }
}

impl<I, E, P, D> Iqs323<I, P, D>
where
  I: I2c<SevenBitAddress, Error = E>,
  P: InputPin + OutputPin + Wait,
  D: DelayNs,
{
  /// Reset the device, identify the variant, apply `config` on top of the
  /// registers read back from it, write everything and run ATI.
  pub async fn initialize<S>(&mut self, config: &S) -> Result<Calibration, Error<E>>
  where
    S: PropertySource + ?Sized,
  {
    self.hard_reset().await?;

    let mut words = [0u16; Version::WORDS];
    self.bus.read_words(PROD_NUM, &mut words).await?;
    self.version = Version::from_words(words);

    self.desc = match Desc::find(self.version.product) {
      Some(desc) => desc,
      None => {
        error!("invalid product number: {}", self.version.product);
        return Err(Error::InvalidProduct(self.version.product));
      }
    };

    self.image = RegisterImage::new(self.desc.groups);
    self.image.sync(&mut self.bus, Access::Read).await?;

    self.parse(config)?;

    let calibration = self.write_all().await?;

    // Settle the interface mode and prime the edge baseline.
    self.service(0, &mut Discard).await?;

    Ok(calibration)
  }

  /// Wait for the device to open a communication window on its own.
  pub async fn wait_for_ready(&mut self) -> Result<(), Error<E>> {
    self.bus.wait_for_ready().await
  }

  /// Pulse MCLR through the shared RDY pin and wait for the device to
  /// come back.
  pub(crate) async fn hard_reset(&mut self) -> Result<(), Error<E>> {
    self.bus.rdy.set_low().map_err(|_| Error::Pin)?;

    // Sample MCLR between the device's own RDY assertions.
    self.bus.delay.delay_ms(RESET_TIMEOUT_MS).await;

    self.bus.rdy.set_high().map_err(|_| Error::Pin)?;
    self.bus.delay.delay_us(RDY_SETTLE_US).await;

    self.bus.poll_ready(COMMS_TIMEOUT_US).await.map(drop)
  }

  /// Switch interface and, unless `power` is `None`, power mode. `cmd`
  /// carries one-shot command bits on top of the configured SYS_SETUP.
  pub(crate) async fn write_mode(
    &mut self,
    intf: Interface,
    power: Option<PowerMode>,
    cmd: SysSetup,
  ) -> Result<(), Error<E>> {
    let mut setup = SysSetup::from_bits(self.image.word(Grp::Sys, 0, 0) | cmd.into_bits());
    setup.set_event_mode(intf == Interface::Event);

    if let Some(power) = power {
      setup.set_power_mode(power.into_bits());
    }

    let res = self.bus.write_word(SYS_SETUP, setup.into_bits()).await;
    self.intf = if res.is_ok() { intf } else { Interface::Error };
    res
  }

  /// Acknowledge the reset, write the whole image back and run ATI.
  pub(crate) async fn write_all(&mut self) -> Result<Calibration, Error<E>> {
    // Acknowledge first in case the device resets again mid-way.
    self.write_mode(Interface::Stream, None, SysSetup::new().with_ack_reset(true)).await?;
    self.image.sync(&mut self.bus, Access::Write).await?;
    ati::calibrate(self).await
  }

  /// Run ATI again, e.g. after a change of environment.
  pub async fn calibrate(&mut self) -> Result<Calibration, Error<E>> {
    ati::calibrate(self).await
  }

  /// Enter halt mode.
  pub async fn suspend(&mut self) -> Result<(), Error<E>> {
    self.set_power(Some(PowerMode::Halt)).await
  }

  /// Leave halt mode for the configured power mode.
  pub async fn resume(&mut self) -> Result<(), Error<E>> {
    self.set_power(None).await
  }

  async fn set_power(&mut self, power: Option<PowerMode>) -> Result<(), Error<E>> {
    let mut prod_num = 0;

    // Precisely timed forced communication may leave the device in an
    // invalid state, recognisable by unexpected register contents.
    for _ in 0..NUM_RETRIES {
      self.write_mode(self.intf, power, SysSetup::new()).await?;
      if power.is_none() {
        return Ok(());
      }

      self.bus.delay.delay_ms(COMMS_RETRY_MS).await;

      prod_num = self.bus.read_word(PROD_NUM).await?;
      if prod_num == self.desc.prod_num {
        return Ok(());
      }

      warn!("unexpected product number {} after mode change", prod_num);
      self.hard_reset().await?;
      self.write_all().await?;
    }

    Err(Error::InvalidProduct(prod_num))
  }

  /// `true` if any channel reports movement.
  pub async fn movement_status(&mut self) -> Result<bool, Error<E>> {
    let mut words = [0u16; 2];
    self.bus.read_words(MOV_STATUS, &mut words).await?;

    if words[1] != COMMS_ERROR {
      error!("unexpected movement status");
      self.hard_reset().await?;
      self.write_all().await?;
      return Err(Error::NotReady);
    }

    Ok(words[0] & ((1 << NUM_CHAN) - 1) != 0)
  }
}

impl<I, E, P, D> Calibrate<E> for Iqs323<I, P, D>
where
  I: I2c<SevenBitAddress, Error = E>,
  P: InputPin + OutputPin + Wait,
  D: DelayNs,
{
  async fn request(&mut self) -> Result<(), Error<E>> {
    self.write_mode(Interface::Stream, None, SysSetup::new().with_redo_ati(true)).await
  }

  async fn wait(&mut self) -> Result<Window, Error<E>> {
    Window::from_poll(self.bus.poll_ready(ATI_TIMEOUT_US).await, ATI_TIMEOUT_US)
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
    self.write_mode(Interface::Event, None, SysSetup::new()).await
  }
}

#[cfg(test)]
mod tests;
