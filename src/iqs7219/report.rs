use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::digital::Wait;
use embedded_hal_async::i2c::{I2c, SevenBitAddress};

use super::regs::*;
use super::{Iqs7219, Snapshot};
use crate::ati;
use crate::event::{edge, Event, EventKind, EventSink, Outcome, Recovery, Source};
use crate::Error;

const KINDS: [EventKind; 3] = [EventKind::Halt, EventKind::Proximity, EventKind::Touch];

/// Channel value selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Scan {
  #[default]
  Delta,
  Filtered,
  Raw,
  Lta,
  Variance,
  /// Halt, proximity and touch flags, bits 0 to 2.
  Flags,
}

impl Scan {
  /// In `azoteq,scan-mux` order.
  pub(crate) const ALL: [Scan; 6] = [Scan::Delta, Scan::Filtered, Scan::Raw, Scan::Lta, Scan::Variance, Scan::Flags];
}

/// One channel's share of the status block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Readings {
  pub filtered: u16,
  pub lta: u16,
  pub raw: u16,
  pub variance: u32,
  /// `lta - filtered`, clamped at zero.
  pub delta: u16,
  pub flags: u8,
}

impl Readings {
  fn decode(report: &[u16; REPORT_LEN], ch: usize) -> Self {
    let filtered = report[2 + ch * 2];
    let lta = report[3 + ch * 2];

    Self {
      filtered,
      lta,
      raw: report[10 + ch],
      variance: u32::from(report[7 + ch * 2]) << 16 | u32::from(report[6 + ch * 2]),
      delta: lta.saturating_sub(filtered),
      flags: (report[1] >> (ch * 4) & 0x000F) as u8,
    }
  }

  pub fn get(&self, scan: Scan) -> u32 {
    match scan {
      Scan::Delta => self.delta.into(),
      Scan::Filtered => self.filtered.into(),
      Scan::Raw => self.raw.into(),
      Scan::Lta => self.lta.into(),
      Scan::Variance => self.variance,
      Scan::Flags => self.flags.into(),
    }
  }
}

impl<I, E, P, D, R> Iqs7219<I, P, D, R>
where
  I: I2c<SevenBitAddress, Error = E>,
  P: InputPin + Wait,
  D: DelayNs,
  R: OutputPin,
{
  /// Read the status block, recover the device if needed and dispatch
  /// every change since the previous call to `sink`.
  ///
  /// Samples go out for every channel whenever the trigger is enabled and
  /// either the device streams or some flag changed.
  pub async fn service<K>(&mut self, timestamp: u64, sink: &mut K) -> Result<Outcome, Error<E>>
  where
    K: EventSink + ?Sized,
  {
    self.attached()?;

    let mut report = [0u16; REPORT_LEN];
    self.bus.read_words(SYS_STATUS, &mut report).await?;

    let status = SysStatus::from_bits(report[0]);

    if status.reset() {
      error!("unexpected device reset");
      self.write_all().await?;
      return Ok(Outcome::Retry(Recovery::Reset));
    }

    if status.ati_error() {
      error!("unexpected ATI error");
      ati::calibrate(self).await?;
      return Ok(Outcome::Retry(Recovery::AtiError));
    }

    if status.ati_active() {
      return Ok(Outcome::Retry(Recovery::AtiActive));
    }

    let pxs = report[1];
    let readings: [Readings; NUM_CHAN] = core::array::from_fn(|ch| Readings::decode(&report, ch));
    let mut pending = self.trigger && self.intf == Interface::Stream;

    for (ch, channel) in self.channels.iter().enumerate() {
      for (i, kind) in KINDS.iter().enumerate() {
        let mask = (channel.events & (1 << i)) << (ch * 4);

        let Some(edge) = edge(self.snapshot.pxs, pxs, mask) else {
          continue;
        };

        pending |= self.trigger;

        if channel.enabled {
          sink.event(Event { source: Source::Channel(ch as u8), kind: *kind, edge, timestamp });
        }
      }
    }

    if pending {
      for (ch, channel) in self.channels.iter().enumerate() {
        sink.sample(timestamp, ch as u8, readings[ch].get(channel.scan));
      }
    }

    sink.sync();

    self.snapshot = Snapshot { pxs, readings };

    Ok(Outcome::Ready)
  }

  /// Service the device and return one fresh value of `ch`.
  pub async fn read<K>(&mut self, ch: usize, scan: Scan, timestamp: u64, sink: &mut K) -> Result<u32, Error<E>>
  where
    K: EventSink + ?Sized,
  {
    if ch >= NUM_CHAN {
      return Err(Error::Unsupported);
    }

    match self.service(timestamp, sink).await? {
      Outcome::Ready => Ok(self.snapshot.readings[ch].get(scan)),
      Outcome::Retry(_) => Err(Error::NotReady),
    }
  }
}
