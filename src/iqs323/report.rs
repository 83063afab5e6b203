use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::digital::Wait;
use embedded_hal_async::i2c::{I2c, SevenBitAddress};

use super::regs::*;
use super::{Interface, Iqs323, Snapshot};
use crate::ati;
use crate::event::{edge, Edge, Event, EventKind, EventSink, Outcome, Recovery, SliderGesture, Source};
use crate::rw::COMMS_ERROR;
use crate::Error;

const SLIDER_GESTURES: [SliderGesture; 7] = [
  SliderGesture::Press,
  SliderGesture::Tap,
  SliderGesture::SwipePositive,
  SliderGesture::SwipeNegative,
  SliderGesture::FlickPositive,
  SliderGesture::FlickNegative,
  SliderGesture::Hold,
];

/// Live readings of one enabled channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelInfo {
  pub prox: bool,
  pub touch: bool,
  /// Filtered counts.
  pub counts: u16,
  /// Long-term average.
  pub lta: u16,
  /// `lta - counts`, clamped at zero.
  pub delta: u16,
  /// Present when release or movement detection is enabled on the channel.
  pub motion: Option<MotionInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionInfo {
  /// Long-term average while the channel is active.
  pub lta_active: u16,
  /// Delta captured at touch, REL variant only.
  pub delta_snapshot: Option<u16>,
  /// MOV variant only.
  pub moving: Option<bool>,
}

impl<I, E, P, D> Iqs323<I, P, D>
where
  I: I2c<SevenBitAddress, Error = E>,
  P: InputPin + OutputPin + Wait,
  D: DelayNs,
{
  /// Read the status block, recover the device if needed and dispatch
  /// every edge since the previous call to `sink`.
  ///
  /// Call this whenever RDY asserts; `timestamp` is stamped on every event.
  pub async fn service<K>(&mut self, timestamp: u64, sink: &mut K) -> Result<Outcome, Error<E>>
  where
    K: EventSink + ?Sized,
  {
    let mut report = [0u16; MIN_REPORT_LEN];
    self.process(timestamp, &mut report, sink).await
  }

  /// `true` if any event marked `azoteq,wear-select` is active.
  pub async fn wear_status<K>(&mut self, timestamp: u64, sink: &mut K) -> Result<bool, Error<E>>
  where
    K: EventSink + ?Sized,
  {
    let mut report = [0u16; MIN_REPORT_LEN];
    self.read_report(timestamp, &mut report, sink).await?;
    Ok(report[0] & self.events.wear != 0)
  }

  /// Counts, LTA and delta of every enabled channel. Events decoded along
  /// the way still go to `sink`.
  pub async fn channel_info<K>(
    &mut self,
    timestamp: u64,
    sink: &mut K,
  ) -> Result<[Option<ChannelInfo>; NUM_CHAN], Error<E>>
  where
    K: EventSink + ?Sized,
  {
    let mut report = [0u16; MAX_REPORT_LEN];
    self.read_report(timestamp, &mut report, sink).await?;
    Ok(core::array::from_fn(|ch| self.channel(&report, ch)))
  }

  async fn read_report<K>(&mut self, timestamp: u64, report: &mut [u16], sink: &mut K) -> Result<(), Error<E>>
  where
    K: EventSink + ?Sized,
  {
    match self.process(timestamp, report, sink).await? {
      Outcome::Ready => Ok(()),
      Outcome::Retry(_) => Err(Error::NotReady),
    }
  }

  async fn process<K>(&mut self, timestamp: u64, report: &mut [u16], sink: &mut K) -> Result<Outcome, Error<E>>
  where
    K: EventSink + ?Sized,
  {
    self.bus.read_words(SYS_STATUS, report).await?;

    // An unimplemented register must read back as the comms sentinel;
    // anything else means the device lost track of the protocol.
    if report[MIN_REPORT_LEN - 1] != COMMS_ERROR {
      error!("unexpected device status");
      self.hard_reset().await?;
      self.write_all().await?;
      return Ok(Outcome::Retry(Recovery::Desync));
    }

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

    let mut intf = Interface::Event;
    let old = self.snapshot;

    for ch in 0..NUM_CHAN {
      for ev in KP_EVENTS.iter() {
        let mask = ev.mask << (ch * 2 + 8);
        if self.events.keys & mask == 0 {
          continue;
        }

        let kind = match ev.key {
          Key::Prox => EventKind::Proximity,
          Key::Touch => EventKind::Touch,
          _ => continue,
        };

        if let Some(edge) = edge(old.status, report[0], mask) {
          sink.event(Event { source: Source::Channel(ch as u8), kind, edge, timestamp });
        }
      }
    }

    let pos = report[2];
    let pressed = pos < u16::MAX;

    if self.events.position {
      if pressed {
        sink.position(Source::Slider, Some(pos));
        intf = Interface::Stream;
      } else if old.pressed {
        sink.position(Source::Slider, None);
      }
    }

    let slider = report[1] & 0x00FF & !SLDR_STATUS_EVENT;
    let mut momentary = 0u8;

    for (i, ev) in SL_EVENTS.iter().enumerate() {
      if self.events.slider & (1 << i) == 0 {
        continue;
      }

      let edge = match ev.mask {
        0 => edge(old.pressed as u16, pressed as u16, 1),
        mask if mask & SLDR_STATUS_BUSY != 0 => edge(old.slider, slider, mask),
        mask if slider & mask == mask => {
          momentary |= 1 << i;
          Some(Edge::Rising)
        }
        _ => None,
      };

      if let Some(edge) = edge {
        sink.event(slider_event(i, edge, timestamp));
      }
    }

    // Taps and flicks only last one report; release them right away.
    if momentary != 0 {
      sink.sync();
      for i in (0..SL_EVENTS.len()).filter(|i| momentary & (1 << i) != 0) {
        sink.event(slider_event(i, Edge::Falling, timestamp));
      }
    }

    sink.sync();

    self.snapshot = Snapshot { status: report[0], slider, pressed };

    if intf != self.intf {
      self.write_mode(intf, None, SysSetup::new()).await?;
    }

    Ok(Outcome::Ready)
  }

  fn channel(&self, report: &[u16; MAX_REPORT_LEN], ch: usize) -> Option<ChannelInfo> {
    let setup = self.image.word(Grp::Snsr, ch, 0);
    if setup & SNSR_SETUP_0_CHAN_EN == 0 {
      return None;
    }

    let shift = ch * 2 + 8;
    let counts = report[3 + ch * 2];
    let lta = report[4 + ch * 2];
    let mov = self.desc.is_mov();

    let motion = (setup & SNSR_SETUP_0_MOV_EN != 0).then(|| MotionInfo {
      lta_active: report[16 + ch],
      delta_snapshot: (!mov).then_some(report[19 + ch]),
      moving: mov.then_some(report[19] & (1 << ch) != 0),
    });

    Some(ChannelInfo {
      prox: report[0] & (EVENT_MASK_PROX << shift) != 0,
      touch: report[0] & (EVENT_MASK_TOUCH << shift) != 0,
      counts,
      lta,
      delta: lta.saturating_sub(counts),
      motion,
    })
  }
}

fn slider_event(index: usize, edge: Edge, timestamp: u64) -> Event {
  Event { source: Source::Slider, kind: EventKind::Slider(SLIDER_GESTURES[index]), edge, timestamp }
}
