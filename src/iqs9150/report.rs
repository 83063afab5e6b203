use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::digital::Wait;
use embedded_hal_async::i2c::{I2c, SevenBitAddress};

use super::regs::*;
use super::Iqs9150;
use crate::event::{edge, Contact, Edge, Event, EventSink, Outcome, Recovery};
use crate::rw::CommsMode;
use crate::Error;

/// Contact in `slot` of the status block; a zero pressure means the slot is
/// idle.
fn decode_contact(report: &[u16; REPORT_LEN], slot: usize) -> Option<Contact> {
  let at = 6 + slot * 4;
  let contact = Contact { x: report[at], y: report[at + 1], pressure: report[at + 2], area: report[at + 3] };

  (contact.pressure != 0).then_some(contact)
}

impl<I, E, P, D, R> Iqs9150<I, P, D, R>
where
  I: I2c<SevenBitAddress, Error = E>,
  P: InputPin + Wait,
  D: DelayNs,
  R: OutputPin,
{
  /// Read the status block, recover from a device reset and dispatch
  /// contacts and events to `sink`.
  ///
  /// Contacts are withheld while trackpad ATI is failing or running again;
  /// the call still returns [`Outcome::Ready`] in that case.
  pub async fn service<K>(&mut self, timestamp: u64, sink: &mut K) -> Result<Outcome, Error<E>>
  where
    K: EventSink + ?Sized,
  {
    let mut report = [0u16; REPORT_LEN];
    self.bus.read_words(STATUS, &mut report).await?;

    let (travel_x, travel_y) = (report[0], report[1]);
    let flags: [u16; 4] = [report[2], report[3], report[4], report[5]];
    let info = Info::from_bits(flags[2]);

    if info.show_reset() {
      error!("unexpected device reset");

      // The device may or may not expect forced communication coming out of
      // reset, so the first write must wait for a window.
      let setup = self.word(CONFIG);
      self.bus.mode = CommsMode::Waiting;
      self.bus.write_word(CONFIG, setup).await?;
      self.bus.mode = self.comms;

      self.snapshot = Default::default();
      self.write_all().await?;
      return Ok(Outcome::Retry(Recovery::Reset));
    }

    if info.tp_ati_error() {
      error!("unexpected trackpad ATI error");
    } else if info.tp_ati_again() {
      debug!("new trackpad ATI occurrence");
    } else {
      self.report_contacts(&report, sink);
    }

    if info.alp_ati_error() {
      error!("unexpected ALP ATI error");
    } else if info.alp_ati_again() {
      debug!("new ALP ATI occurrence");
    }

    let mut momentary = 0u32;
    let mut emitted = false;

    for (i, desc) in EVENTS.iter().enumerate() {
      if self.events & (1 << i) == 0 || desc.scope.ati_busy(info) {
        continue;
      }

      if desc.scope == Scope::Alp && info.charge_mode() < CHARGE_MODE_LP1 {
        continue;
      }

      // Scroll directions share a flag and differ by the sign of travel.
      let travel = match desc.key {
        Key::ScrollX => Some(travel_x),
        Key::ScrollY => Some(travel_y),
        _ => None,
      };
      if let (Some(travel), Some(sign)) = (travel, desc.travel) {
        if travel & TRAVEL_NEG != sign {
          continue;
        }
      }

      let word = desc.scope.status_word();
      let source = desc.scope.source();

      if desc.key.is_momentary() {
        if flags[word] & desc.status == 0 {
          continue;
        }
        momentary |= 1 << i;
        sink.event(Event { source, kind: desc.kind, edge: Edge::Rising, timestamp });
      } else if let Some(edge) = edge(self.snapshot.flags[word], flags[word], desc.status) {
        sink.event(Event { source, kind: desc.kind, edge, timestamp });
      } else {
        continue;
      }

      emitted = true;
    }

    // Momentary gestures never report their own release.
    if momentary != 0 {
      sink.sync();

      for (i, desc) in EVENTS.iter().enumerate().filter(|(i, _)| momentary & (1 << i) != 0) {
        sink.event(Event { source: desc.scope.source(), kind: desc.kind, edge: Edge::Falling, timestamp });
      }
    }

    if emitted {
      sink.sync();
    }

    self.snapshot.flags = flags;

    Ok(Outcome::Ready)
  }

  fn report_contacts<K>(&mut self, report: &[u16; REPORT_LEN], sink: &mut K)
  where
    K: EventSink + ?Sized,
  {
    let mut changed = false;

    for slot in 0..self.num_contacts() {
      let contact = decode_contact(report, slot);

      if contact != self.snapshot.contacts[slot] {
        sink.contact(slot as u8, contact);
        self.snapshot.contacts[slot] = contact;
        changed = true;
      }
    }

    if changed {
      sink.sync();
    }
  }
}
