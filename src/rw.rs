use embedded_hal::digital::InputPin;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::digital::Wait;
use embedded_hal_async::i2c::{I2c, Operation, SevenBitAddress};

use crate::Error;

/// Attempts made for every burst before the error is surfaced.
pub(crate) const NUM_RETRIES: usize = 5;
/// Back-off after a failed bus transfer.
pub(crate) const COMMS_RETRY_MS: u32 = 50;
/// Word returned by the device when it is addressed outside a comms window.
pub(crate) const COMMS_ERROR: u16 = 0xEEEE;

const FORCE_COMMS: u8 = 0xFF;
/// Longest status block read through [`Transport::read_words`].
const MAX_WORDS: usize = 64;

/// How the host obtains a communication window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommsMode {
  /// Wait for the device to assert RDY on its own (start-up).
  Waiting,
  /// The device clock-stretches, no handshake required.
  FreeRunning,
  /// Every unsolicited transfer is preceded by the force-comms byte.
  Forced,
}

/// Width of the register address sent ahead of each burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AddrWidth {
  U8,
  /// Little-endian 16-bit address.
  U16,
}

/// Per-product handshake timing.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Timing {
  /// Settle time after the force-comms byte and after every burst, while
  /// RDY deasserts following the stop condition.
  pub(crate) settle_us: u32,
  /// RDY poll interval.
  pub(crate) poll_us: u32,
  /// How long to wait for RDY after a force-comms request.
  pub(crate) comms_timeout_us: u32,
  /// How long to wait for RDY in [`CommsMode::Waiting`].
  pub(crate) start_timeout_us: u32,
  /// Longest burst the device accepts in one transfer.
  pub(crate) max_burst: usize,
  pub(crate) width: AddrWidth,
}

/// RDY-gated register access shared by every product driver.
pub(crate) struct Transport<I, P, D> {
  pub(crate) i2c: I,
  pub(crate) rdy: P,
  pub(crate) delay: D,
  pub(crate) mode: CommsMode,
  addr: u8,
  timing: &'static Timing,
}

impl<I, P, D> Transport<I, P, D> {
  pub(crate) fn new(i2c: I, rdy: P, delay: D, addr: u8, mode: CommsMode, timing: &'static Timing) -> Self {
    Self { i2c, rdy, delay, mode, addr, timing }
  }

  pub(crate) fn release(self) -> (I, P, D) {
    (self.i2c, self.rdy, self.delay)
  }
}

impl<I, E, P, D> Transport<I, P, D>
where
  I: I2c<SevenBitAddress, Error = E>,
  P: InputPin + Wait,
  D: DelayNs,
{
  /// RDY is active low.
  pub(crate) fn ready(&mut self) -> Result<bool, Error<E>> {
    self.rdy.is_low().map_err(|_| Error::Pin)
  }

  /// Wait for the next RDY assertion driven by the device.
  pub(crate) async fn wait_for_ready(&mut self) -> Result<(), Error<E>> {
    self.rdy.wait_for_low().await.map_err(|_| Error::Pin)
  }

  /// Poll RDY every `poll_us` until it asserts, returning the time spent.
  pub(crate) async fn poll_ready(&mut self, timeout_us: u32) -> Result<u32, Error<E>> {
    let step = self.timing.poll_us.max(1);
    let mut waited = 0;

    loop {
      self.delay.delay_us(step).await;
      waited += step;

      if self.ready()? {
        return Ok(waited);
      }
      if waited >= timeout_us {
        return Err(Error::Timeout);
      }
    }
  }

  async fn settle(&mut self) {
    self.delay.delay_us(self.timing.settle_us).await;
  }

  async fn handshake(&mut self) -> Result<(), Error<E>> {
    match self.mode {
      CommsMode::FreeRunning => Ok(()),
      CommsMode::Waiting => self.poll_ready(self.timing.start_timeout_us).await.map(drop),
      CommsMode::Forced => {
        if self.ready()? {
          return Ok(());
        }

        if let Err(e) = self.i2c.write(self.addr, &[FORCE_COMMS]).await {
          self.delay.delay_ms(COMMS_RETRY_MS).await;
          return Err(Error::I2c(e));
        }

        self.settle().await;
        self.poll_ready(self.timing.comms_timeout_us).await.map(drop)
      }
    }
  }

  fn header(&self, reg: u16) -> ([u8; 2], usize) {
    match self.timing.width {
      AddrWidth::U8 => ([reg as u8, 0], 1),
      AddrWidth::U16 => (reg.to_le_bytes(), 2),
    }
  }

  async fn read_once(&mut self, reg: u16, buf: &mut [u8]) -> Result<(), Error<E>> {
    self.handshake().await?;

    let (hdr, len) = self.header(reg);
    if let Err(e) = self.i2c.write_read(self.addr, &hdr[..len], buf).await {
      self.delay.delay_ms(COMMS_RETRY_MS).await;
      return Err(Error::I2c(e));
    }

    if buf.len() >= 2 && u16::from_le_bytes([buf[0], buf[1]]) == COMMS_ERROR {
      return Err(Error::NotReady);
    }

    Ok(())
  }

  async fn write_once(&mut self, reg: u16, data: &[u8]) -> Result<(), Error<E>> {
    self.handshake().await?;

    let (hdr, len) = self.header(reg);
    let mut ops = [Operation::Write(&hdr[..len]), Operation::Write(data)];
    if let Err(e) = self.i2c.transaction(self.addr, &mut ops).await {
      self.delay.delay_ms(COMMS_RETRY_MS).await;
      return Err(Error::I2c(e));
    }

    Ok(())
  }

  async fn read_chunk(&mut self, reg: u16, buf: &mut [u8]) -> Result<(), Error<E>> {
    let mut res = Ok(());

    for _ in 0..NUM_RETRIES {
      res = self.read_once(reg, buf).await;
      if res.is_ok() {
        break;
      }
    }

    self.settle().await;

    if res.is_err() {
      error!("failed to read from address {=u16:#06x}", reg);
    }

    res
  }

  async fn write_chunk(&mut self, reg: u16, data: &[u8]) -> Result<(), Error<E>> {
    let mut res = Ok(());

    for _ in 0..NUM_RETRIES {
      res = self.write_once(reg, data).await;
      if res.is_ok() {
        break;
      }
    }

    self.settle().await;

    if res.is_err() {
      error!("failed to write to address {=u16:#06x}", reg);
    }

    res
  }

  /// Read `buf.len()` bytes starting at `reg`, splitting the transfer at the
  /// product's page size.
  pub(crate) async fn read_burst(&mut self, reg: u16, buf: &mut [u8]) -> Result<(), Error<E>> {
    let max = self.timing.max_burst.max(2);
    let mut offs = 0;

    for chunk in buf.chunks_mut(max) {
      let len = chunk.len();
      self.read_chunk(reg.wrapping_add(self.advance(offs)), chunk).await?;
      offs += len;
    }

    Ok(())
  }

  pub(crate) async fn write_burst(&mut self, reg: u16, data: &[u8]) -> Result<(), Error<E>> {
    let max = self.timing.max_burst.max(2);
    let mut offs = 0;

    for chunk in data.chunks(max) {
      self.write_chunk(reg.wrapping_add(self.advance(offs)), chunk).await?;
      offs += chunk.len();
    }

    Ok(())
  }

  // 8-bit maps are word addressed, 16-bit maps are byte addressed.
  fn advance(&self, bytes: usize) -> u16 {
    match self.timing.width {
      AddrWidth::U8 => (bytes / 2) as u16,
      AddrWidth::U16 => bytes as u16,
    }
  }

  pub(crate) async fn read_word(&mut self, reg: u16) -> Result<u16, Error<E>> {
    let mut buf = [0u8; 2];
    self.read_burst(reg, &mut buf).await?;
    Ok(u16::from_le_bytes(buf))
  }

  pub(crate) async fn write_word(&mut self, reg: u16, val: u16) -> Result<(), Error<E>> {
    self.write_burst(reg, &val.to_le_bytes()).await
  }

  /// Read consecutive words in a single burst.
  pub(crate) async fn read_words(&mut self, reg: u16, words: &mut [u16]) -> Result<(), Error<E>> {
    let mut buf = [0u8; MAX_WORDS * 2];
    let buf = buf.get_mut(..words.len() * 2).ok_or(Error::BufferOverflow)?;
    self.read_burst(reg, buf).await?;

    for (w, b) in words.iter_mut().zip(buf.chunks_exact(2)) {
      *w = u16::from_le_bytes([b[0], b[1]]);
    }
    Ok(())
  }
}
