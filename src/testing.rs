use std::collections::VecDeque;
use std::vec;
use std::vec::Vec;

use embedded_hal::digital::{ErrorType as PinErrorType, InputPin, OutputPin};
use embedded_hal::i2c::{ErrorKind, ErrorType as I2cErrorType};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::digital::Wait;
use embedded_hal_async::i2c::{I2c, Operation, SevenBitAddress};

use crate::event::{Contact, Edge, Event, EventKind, EventSink, Source};
use crate::rw::{AddrWidth, COMMS_ERROR};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MockError;

impl embedded_hal::i2c::Error for MockError {
  fn kind(&self) -> ErrorKind {
    ErrorKind::Other
  }
}

/// Register file behind a fake I2C bus.
///
/// Word-addressed maps store word `n` at byte `2n`; byte-addressed maps store
/// byte `n` at byte `n`. Reads are served from queued responses first, then
/// from memory. Every register write lands in memory and is recorded.
pub(crate) struct MockBus {
  width: AddrWidth,
  mem: Vec<u8>,
  queued: VecDeque<(u16, Vec<u8>)>,
  writes: Vec<(u16, Vec<u8>)>,
  sentinel_reads: usize,
  bus_errors: usize,
  reads: usize,
  wake_bytes: usize,
}

impl MockBus {
  pub(crate) fn new(width: AddrWidth) -> Self {
    Self {
      width,
      mem: vec![0; 0x2_0000],
      queued: VecDeque::new(),
      writes: Vec::new(),
      sentinel_reads: 0,
      bus_errors: 0,
      reads: 0,
      wake_bytes: 0,
    }
  }

  fn offset(&self, reg: u16) -> usize {
    match self.width {
      AddrWidth::U8 => reg as usize * 2,
      AddrWidth::U16 => reg as usize,
    }
  }

  pub(crate) fn with_word(mut self, reg: u16, val: u16) -> Self {
    self.set_word(reg, val);
    self
  }

  pub(crate) fn with_words(mut self, reg: u16, vals: &[u16]) -> Self {
    let step = match self.width {
      AddrWidth::U8 => 1,
      AddrWidth::U16 => 2,
    };
    for (i, v) in vals.iter().enumerate() {
      self.set_word(reg + (i as u16) * step, *v);
    }
    self
  }

  pub(crate) fn with_bytes(mut self, reg: u16, bytes: &[u8]) -> Self {
    let at = self.offset(reg);
    self.mem[at..at + bytes.len()].copy_from_slice(bytes);
    self
  }

  /// Serve the next read of `reg` from `words` instead of memory.
  pub(crate) fn push_words(&mut self, reg: u16, words: &[u16]) {
    let bytes = words.iter().flat_map(|w| w.to_le_bytes()).collect();
    self.queued.push_back((reg, bytes));
  }

  pub(crate) fn with_sentinel_reads(mut self, n: usize) -> Self {
    self.sentinel_reads = n;
    self
  }

  pub(crate) fn with_bus_errors(mut self, n: usize) -> Self {
    self.bus_errors = n;
    self
  }

  pub(crate) fn set_word(&mut self, reg: u16, val: u16) {
    let at = self.offset(reg);
    self.mem[at..at + 2].copy_from_slice(&val.to_le_bytes());
  }

  pub(crate) fn word(&self, reg: u16) -> u16 {
    let at = self.offset(reg);
    u16::from_le_bytes([self.mem[at], self.mem[at + 1]])
  }

  pub(crate) fn writes(&self) -> &[(u16, Vec<u8>)] {
    &self.writes
  }

  /// Every word written to `reg`, oldest first.
  pub(crate) fn written_words(&self, reg: u16) -> Vec<u16> {
    self
      .writes
      .iter()
      .filter(|(r, d)| *r == reg && d.len() >= 2)
      .map(|(_, d)| u16::from_le_bytes([d[0], d[1]]))
      .collect()
  }

  pub(crate) fn reads(&self) -> usize {
    self.reads
  }

  pub(crate) fn wake_bytes(&self) -> usize {
    self.wake_bytes
  }

  fn parse_reg(&self, hdr: &[u8]) -> u16 {
    match self.width {
      AddrWidth::U8 => hdr[0] as u16,
      AddrWidth::U16 => u16::from_le_bytes([hdr[0], hdr[1]]),
    }
  }

  fn hdr_len(&self) -> usize {
    match self.width {
      AddrWidth::U8 => 1,
      AddrWidth::U16 => 2,
    }
  }

  fn serve_read(&mut self, reg: u16, buf: &mut [u8]) {
    self.reads += 1;

    if self.sentinel_reads > 0 {
      self.sentinel_reads -= 1;
      for pair in buf.chunks_mut(2) {
        let bytes = COMMS_ERROR.to_le_bytes();
        pair.copy_from_slice(&bytes[..pair.len()]);
      }
      return;
    }

    if let Some(idx) = self.queued.iter().position(|(r, _)| *r == reg) {
      if let Some((_, data)) = self.queued.remove(idx) {
        let n = data.len().min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        return;
      }
    }

    let at = self.offset(reg);
    buf.copy_from_slice(&self.mem[at..at + buf.len()]);
  }
}

impl I2cErrorType for MockBus {
  type Error = MockError;
}

impl I2c<SevenBitAddress> for MockBus {
  async fn transaction(&mut self, _address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
    if self.bus_errors > 0 {
      self.bus_errors -= 1;
      return Err(MockError);
    }

    let mut written: Vec<u8> = Vec::new();
    let mut read = false;

    for op in operations.iter_mut() {
      match op {
        Operation::Write(data) => written.extend_from_slice(data),
        Operation::Read(buf) => {
          let reg = self.parse_reg(&written);
          self.serve_read(reg, buf);
          read = true;
        }
      }
    }

    if read {
      return Ok(());
    }

    if written == [0xFF] {
      self.wake_bytes += 1;
      return Ok(());
    }

    let hl = self.hdr_len();
    let reg = self.parse_reg(&written);
    let data = written[hl..].to_vec();
    let at = self.offset(reg);
    self.mem[at..at + data.len()].copy_from_slice(&data);
    self.writes.push((reg, data));
    Ok(())
  }
}

/// RDY line with scripted levels.
///
/// `true` means asserted (driven low by the device). The last scripted level
/// repeats once the script runs out.
pub(crate) struct MockPin {
  levels: VecDeque<bool>,
  last: bool,
  driven: Vec<bool>,
}

impl MockPin {
  pub(crate) fn asserted() -> Self {
    Self::script(&[true])
  }

  pub(crate) fn deasserted() -> Self {
    Self::script(&[false])
  }

  pub(crate) fn script(levels: &[bool]) -> Self {
    Self { levels: levels.iter().copied().collect(), last: levels.last().copied().unwrap_or(true), driven: Vec::new() }
  }

  /// Levels driven by the host, `true` meaning pulled low.
  pub(crate) fn driven(&self) -> &[bool] {
    &self.driven
  }

  fn level(&mut self) -> bool {
    match self.levels.pop_front() {
      Some(l) => {
        self.last = l;
        l
      }
      None => self.last,
    }
  }
}

impl PinErrorType for MockPin {
  type Error = core::convert::Infallible;
}

impl InputPin for MockPin {
  fn is_high(&mut self) -> Result<bool, Self::Error> {
    Ok(!self.level())
  }

  fn is_low(&mut self) -> Result<bool, Self::Error> {
    Ok(self.level())
  }
}

impl OutputPin for MockPin {
  fn set_low(&mut self) -> Result<(), Self::Error> {
    self.driven.push(true);
    Ok(())
  }

  fn set_high(&mut self) -> Result<(), Self::Error> {
    self.driven.push(false);
    Ok(())
  }
}

impl Wait for MockPin {
  async fn wait_for_high(&mut self) -> Result<(), Self::Error> {
    Ok(())
  }

  async fn wait_for_low(&mut self) -> Result<(), Self::Error> {
    Ok(())
  }

  async fn wait_for_rising_edge(&mut self) -> Result<(), Self::Error> {
    Ok(())
  }

  async fn wait_for_falling_edge(&mut self) -> Result<(), Self::Error> {
    Ok(())
  }

  async fn wait_for_any_edge(&mut self) -> Result<(), Self::Error> {
    Ok(())
  }
}

/// Delay that only accumulates the requested time.
#[derive(Default, Debug)]
pub(crate) struct MockDelay {
  pub(crate) calls: u32,
  pub(crate) total_us: u64,
}

impl DelayNs for MockDelay {
  async fn delay_ns(&mut self, ns: u32) {
    self.calls += 1;
    self.total_us += ns as u64 / 1000;
  }

  async fn delay_us(&mut self, us: u32) {
    self.calls += 1;
    self.total_us += us as u64;
  }

  async fn delay_ms(&mut self, ms: u32) {
    self.calls += 1;
    self.total_us += ms as u64 * 1000;
  }
}

/// Sink that keeps everything it is handed.
#[derive(Default, Debug)]
pub(crate) struct Recorder {
  pub(crate) events: Vec<Event>,
  pub(crate) positions: Vec<(Source, Option<u16>)>,
  pub(crate) samples: Vec<(u64, u8, u32)>,
  pub(crate) contacts: Vec<(u8, Option<Contact>)>,
  pub(crate) syncs: usize,
}

impl Recorder {
  /// Kind and direction of every event, oldest first.
  pub(crate) fn edges(&self) -> Vec<(Source, EventKind, Edge)> {
    self.events.iter().map(|e| (e.source, e.kind, e.edge)).collect()
  }

  pub(crate) fn clear(&mut self) {
    *self = Self::default();
  }
}

impl EventSink for Recorder {
  fn event(&mut self, event: Event) {
    self.events.push(event);
  }

  fn position(&mut self, source: Source, position: Option<u16>) {
    self.positions.push((source, position));
  }

  fn sample(&mut self, timestamp: u64, channel: u8, value: u32) {
    self.samples.push((timestamp, channel, value));
  }

  fn contact(&mut self, slot: u8, contact: Option<Contact>) {
    self.contacts.push((slot, contact));
  }

  fn sync(&mut self) {
    self.syncs += 1;
  }
}
