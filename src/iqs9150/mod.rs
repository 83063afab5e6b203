//! IQS9150 and IQS9151 trackpad controllers.
//!
//! Up to seven contacts are reported through
//! [`EventSink::contact`](crate::EventSink::contact). Single and double
//! finger gestures, the switch input and the ALP (low-power proximity)
//! channel produce [`Event`]s. Hold and palm gestures and the switch
//! persist while active; every other gesture is reported as a press
//! immediately followed by a release.
//!
//! The product is picked from the product number read during
//! [`Iqs9150::initialize`]. Unlike the other controllers the register map is
//! byte addressed, with 16-bit register addresses.
//!
//! [`Event`]: crate::Event

mod parse;
mod regs;
mod report;

use core::fmt;

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::digital::Wait;
use embedded_hal_async::i2c::{I2c, SevenBitAddress};

use crate::config::{read_max, PropertySource};
use crate::defs::{NoPin, Version};
use crate::event::Contact;
use crate::image::{Access, RegisterImage};
use crate::rw::{AddrWidth, CommsMode, Timing, Transport};
use crate::Error;

use regs::*;

static TIMING: Timing = Timing {
  settle_us: RDY_SETTLE_US,
  poll_us: POLL_US,
  comms_timeout_us: COMMS_TIMEOUT_US,
  start_timeout_us: START_TIMEOUT_US,
  max_burst: 4096,
  width: AddrWidth::U16,
};

/// Product variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Variant {
  /// 26 RX × 22 TX, product number 0x076A.
  Iqs9150,
  /// 13 RX × 12 TX, product number 0x09BC.
  Iqs9151,
}

/// Firmware and exported settings versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Firmware {
  pub version: Version,
  pub settings_major: u8,
  pub settings_minor: u8,
}

impl fmt::Display for Firmware {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}.{}", self.version, self.settings_major, self.settings_minor)
  }
}

/// Last validated status.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Snapshot {
  pub(crate) flags: [u16; 4],
  pub(crate) contacts: [Option<Contact>; MAX_CONTACTS],
}

/// IQS9150/IQS9151 driver.
pub struct Iqs9150<I, P, D, R = NoPin> {
  bus: Transport<I, P, D>,
  reset: Option<R>,
  image: RegisterImage<Grp, BUF_LEN>,
  desc: &'static Desc,
  version: Version,
  /// Mode to return to once a reset recovery has reached the device.
  comms: CommsMode,
  /// Engineering settings, written after the register map when present.
  eng: Option<[u8; ENG_LEN]>,
  /// Bit `n` set for every configured `EVENTS[n]`.
  events: u32,
  snapshot: Snapshot,
}

impl<I, P, D> Iqs9150<I, P, D, NoPin> {
  /// Driver without a reset line.
  pub fn new(i2c: I, rdy: P, delay: D, addr: u8) -> Self {
    Self::build(i2c, rdy, None, delay, addr)
  }
}

impl<I, P, D, R> Iqs9150<I, P, D, R> {
  /// Driver that pulses `reset` (active low) before initialization.
  pub fn with_reset(i2c: I, rdy: P, reset: R, delay: D, addr: u8) -> Self {
    Self::build(i2c, rdy, Some(reset), delay, addr)
  }

  fn build(i2c: I, rdy: P, reset: Option<R>, delay: D, addr: u8) -> Self {
    Self {
      bus: Transport::new(i2c, rdy, delay, addr, CommsMode::Waiting, &TIMING),
      reset,
      image: RegisterImage::new(&GROUPS),
      desc: &DEVS[0],
      version: Version::default(),
      comms: CommsMode::Waiting,
      eng: None,
      events: 0,
      snapshot: Snapshot::default(),
    }
  }

  pub fn version(&self) -> Version {
    self.version
  }

  pub fn variant(&self) -> Variant {
    if self.desc.prod_num == DEVS[1].prod_num {
      Variant::Iqs9151
    } else {
      Variant::Iqs9150
    }
  }

  /// Firmware version alongside the version of the exported settings.
  pub fn firmware(&self) -> Firmware {
    Firmware { version: self.version, settings_major: self.reg(SETTINGS_MAJOR), settings_minor: self.reg(SETTINGS_MINOR) }
  }

  pub fn comms_mode(&self) -> CommsMode {
    self.comms
  }

  /// Largest reported X and Y coordinates.
  pub fn resolution(&self) -> (u16, u16) {
    (self.word(X_RES), self.word(Y_RES))
  }

  /// Contact slots in use.
  pub fn num_contacts(&self) -> usize {
    usize::from(self.reg(NUM_CONTACTS)).min(MAX_CONTACTS)
  }

  /// Contacts decoded by the last successful [`Iqs9150::service`].
  pub fn contacts(&self) -> &[Option<Contact>] {
    &self.snapshot.contacts[..self.num_contacts()]
  }

  /// Give the peripherals back.
  pub fn free(self) -> (I, P, D, Option<R>) {
    let (i2c, rdy, delay) = self.bus.release();
    (i2c, rdy, delay, self.reset)
  }

  fn index(addr: u16) -> usize {
    usize::from(addr.wrapping_sub(BUF_START))
  }

  /// Byte register from the image.
  pub(crate) fn reg(&self, addr: u16) -> u8 {
    self.image.row(Grp::Settings, 0).get(Self::index(addr)).copied().unwrap_or(0)
  }

  pub(crate) fn set_reg(&mut self, addr: u16, val: u8) {
    if let Some(b) = self.image.row_mut(Grp::Settings, 0).get_mut(Self::index(addr)) {
      *b = val;
    }
  }

  pub(crate) fn modify_reg<F: FnOnce(u8) -> u8>(&mut self, addr: u16, f: F) {
    self.set_reg(addr, f(self.reg(addr)))
  }

  /// Word register from the image; words sit at even addresses.
  pub(crate) fn word(&self, addr: u16) -> u16 {
    self.image.word(Grp::Settings, 0, Self::index(addr) / 2)
  }

  pub(crate) fn set_word(&mut self, addr: u16, val: u16) {
    self.image.set_word(Grp::Settings, 0, Self::index(addr) / 2, val)
  }
}

impl<I, E, P, D, R> Iqs9150<I, P, D, R>
where
  I: I2c<SevenBitAddress, Error = E>,
  P: InputPin + Wait,
  D: DelayNs,
  R: OutputPin,
{
  /// Reset and identify the device, settle the comms mode, apply `config`
  /// on top of the registers read back from it, write everything and
  /// trigger ATI.
  ///
  /// `azoteq,forced-comms` on the root node selects forced communication;
  /// otherwise the host must support clock stretching.
  pub async fn initialize<S>(&mut self, config: &S) -> Result<(), Error<E>>
  where
    S: PropertySource + ?Sized,
  {
    let forced = config.has("azoteq,forced-comms");
    let timeout = read_max(config, "azoteq,timeout-comms-ms", u32::from(u16::MAX))?;

    // Until the device knows how to talk, every transfer waits for a window.
    self.bus.mode = CommsMode::Waiting;
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

    let mut setup = self.bus.read_word(CONFIG).await?;
    if forced {
      setup |= CONFIG_FORCED_COMMS;
    } else {
      setup &= !CONFIG_FORCED_COMMS;
    }
    setup = (setup & !CONFIG_EVENT_MASK) | CONFIG_EVENT_MODE | CONFIG_EVENT_ATI | Scope::Trackpad.event_mask();
    self.bus.write_word(CONFIG, setup).await?;

    self.comms = if forced { CommsMode::Forced } else { CommsMode::FreeRunning };
    self.bus.mode = self.comms;

    if let Some(ms) = timeout.filter(|&ms| ms > 0) {
      self.bus.write_word(TIMEOUT_COMMS, ms as u16).await?;
    }

    self.image.sync(&mut self.bus, Access::Read).await?;

    // Outputs stay off unless the configuration enables them.
    self.set_word(CONTROL, 0);
    self.set_word(OTHER, self.word(OTHER) & !OTHER_SW_ENABLE);
    self.modify_reg(ALP_SETUP, |b| b & !ALP_SETUP_ENABLE);

    self.parse(config)?;
    self.snapshot = Snapshot::default();

    self.write_all().await
  }

  /// Wait for the device to open a communication window on its own.
  pub async fn wait_for_ready(&mut self) -> Result<(), Error<E>> {
    self.bus.wait_for_ready().await
  }

  async fn hard_reset(&mut self) -> Result<(), Error<E>> {
    let Some(reset) = self.reset.as_mut() else {
      return Ok(());
    };

    reset.set_low().map_err(|_| Error::Pin)?;
    self.bus.delay.delay_ms(1).await;
    reset.set_high().map_err(|_| Error::Pin)?;

    if let Err(e) = self.bus.poll_ready(START_TIMEOUT_US).await {
      error!("failed to reset device");
      return Err(e);
    }

    Ok(())
  }

  /// Acknowledge the reset, write the register map and the engineering
  /// settings back and trigger ATI.
  pub(crate) async fn write_all(&mut self) -> Result<(), Error<E>> {
    // Acknowledge first in case the device resets again mid-way.
    self.bus.write_word(CONTROL, Control::new().with_ack_reset(true).into_bits()).await?;

    // The comms timeout governs the long burst that follows.
    let timeout = self.word(TIMEOUT_COMMS);
    self.bus.write_word(TIMEOUT_COMMS, timeout).await?;
    self.image.sync(&mut self.bus, Access::Write).await?;

    if let Some(eng) = self.eng {
      self.bus.write_burst(ENG_START, &eng).await?;
    }

    self.calibrate().await
  }

  /// Start ATI on the trackpad and the ALP channel. Progress is reported
  /// through the status block rather than awaited.
  pub async fn calibrate(&mut self) -> Result<(), Error<E>> {
    let control = Control::new().with_ati_tp(true).with_ati_alp(true);
    self.bus.write_word(CONTROL, control.into_bits()).await
  }

  /// Stop sensing until [`Iqs9150::resume`].
  pub async fn suspend(&mut self) -> Result<(), Error<E>> {
    self.bus.write_word(CONTROL, Control::new().with_suspend(true).into_bits()).await
  }

  pub async fn resume(&mut self) -> Result<(), Error<E>> {
    self.bus.write_word(CONTROL, 0).await
  }
}
