//! # Cursors
//!
//! A cursor is one physical end of a stylus (its tip or its eraser) or a puck, as tracked by the tablet driver.
//! A single pen with an eraser thus represents *two* cursors, which share a [`CursorInfo::physical_id`].
//!
//! Cursors are numbered by the driver, and each device owns a contiguous run of them - see [`Cursors`].

/// Mask selecting the general cursor type bits.
pub const CSR_TYPE_GENERAL_MASK: u32 = 0xC000;
/// General type bits of a pen tip.
pub const CSR_TYPE_GENERAL_PENTIP: u32 = 0x4000;
/// General type bits of a puck.
pub const CSR_TYPE_GENERAL_PUCK: u32 = 0x8000;
/// General type bits of a pen eraser.
pub const CSR_TYPE_GENERAL_PENERASER: u32 = 0xC000;

bitflags::bitflags! {
    /// Bitmask of pressed buttons, as reported by the last packet. Bit `n` is the cursor's logical button `n`.
    #[derive(Clone, Copy, Default, Debug, Hash, PartialEq, Eq)]
    pub struct Buttons: u32 {
        const PRIMARY = 1;
        const SECONDARY = 1 << 1;
        const TERTIARY = 1 << 2;
        // Drivers may report any of 32 buttons, keep unnamed bits intact.
        const _ = !0;
    }
}
impl Buttons {
    /// Whether logical button `index` is held. Always false for `index >= 32`.
    #[must_use]
    pub fn is_pressed(self, index: u32) -> bool {
        1u32.checked_shl(index)
            .is_some_and(|bit| self.bits() & bit != 0)
    }
}

/// Broad category of a cursor, derived from its type bits.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, strum::AsRefStr, strum::FromRepr)]
#[repr(u8)]
pub enum CursorType {
    /// The type bits don't name a known category.
    #[default]
    Undefined = 0,
    /// The writing end of a stylus.
    PenTip = 1,
    /// A mouse-like device that rests on the tablet.
    Puck = 2,
    /// The erasing end of a stylus.
    PenEraser = 3,
}
impl CursorType {
    /// Classify cursor type bits. Only the bits under [`CSR_TYPE_GENERAL_MASK`] are considered.
    #[must_use]
    pub const fn classify(type_bits: u32) -> Self {
        match type_bits & CSR_TYPE_GENERAL_MASK {
            CSR_TYPE_GENERAL_PENTIP => Self::PenTip,
            CSR_TYPE_GENERAL_PUCK => Self::Puck,
            CSR_TYPE_GENERAL_PENERASER => Self::PenEraser,
            _ => Self::Undefined,
        }
    }
}

/// Driver-assigned cursor number.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct CursorId(pub u32);
impl CursorId {
    /// Classify this id's own bit pattern. See [`CursorType::classify`].
    ///
    /// For the type the driver reports for this cursor, see
    /// [`Manager::cursor_info`](crate::Manager::cursor_info).
    #[must_use]
    pub const fn cursor_type(self) -> CursorType {
        CursorType::classify(self.0)
    }
}
impl From<u32> for CursorId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// A contiguous run of cursor ids belonging to one device, `first..first + count`.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub struct Cursors {
    pub first: CursorId,
    pub count: u32,
}
impl Cursors {
    #[must_use]
    pub fn contains(&self, cursor: CursorId) -> bool {
        cursor.0 >= self.first.0 && u64::from(cursor.0) < self.end()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
    // u64, a driver could claim a run that crosses u32::MAX. Clipped to the last representable id.
    fn end(&self) -> u64 {
        (u64::from(self.first.0) + u64::from(self.count)).min(u64::from(u32::MAX) + 1)
    }
}
impl IntoIterator for Cursors {
    type Item = CursorId;
    type IntoIter = CursorIter;
    fn into_iter(self) -> Self::IntoIter {
        CursorIter {
            next: u64::from(self.first.0),
            end: self.end(),
        }
    }
}
pub struct CursorIter {
    next: u64,
    end: u64,
}
impl Iterator for CursorIter {
    type Item = CursorId;
    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let id = u32::try_from(self.next).ok()?;
        self.next += 1;
        Some(CursorId(id))
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.end.saturating_sub(self.next)).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

/// Everything the driver reports about one cursor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CursorInfo {
    pub id: CursorId,
    pub name: String,
    /// Whether the cursor is currently present (in range of the tablet).
    pub active: bool,
    /// Serial number baked into the hardware, shared between the ends of a single stylus. `None` if unknown.
    pub physical_id: Option<u32>,
    /// Type derived from the driver's `CSR_TYPE` report. [`CursorType::Undefined`] if not reported.
    pub cursor_type: CursorType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_top_two_bits() {
        assert_eq!(CursorType::classify(0x4000), CursorType::PenTip);
        assert_eq!(CursorType::classify(0x8000), CursorType::Puck);
        assert_eq!(CursorType::classify(0xC000), CursorType::PenEraser);
        assert_eq!(CursorType::classify(0x0000), CursorType::Undefined);
        // Lower bits are ignored.
        assert_eq!(CursorType::classify(0x4812), CursorType::PenTip);
        assert_eq!(CursorType::classify(0xC0FF), CursorType::PenEraser);
        assert_eq!(CursorType::classify(0x3FFF), CursorType::Undefined);
        // As are bits above the mask.
        assert_eq!(CursorType::classify(0x1_8000), CursorType::Puck);
    }

    #[test]
    fn classify_is_stable() {
        for bits in (0..=0xFFFFu32).step_by(0x111) {
            let first = CursorId(bits).cursor_type();
            assert_eq!(first, CursorId(bits).cursor_type());
            assert_eq!(first, CursorType::classify(bits & CSR_TYPE_GENERAL_MASK));
        }
    }

    #[test]
    fn cursor_type_discriminants() {
        assert_eq!(CursorType::Undefined as u8, 0);
        assert_eq!(CursorType::PenTip as u8, 1);
        assert_eq!(CursorType::Puck as u8, 2);
        assert_eq!(CursorType::PenEraser as u8, 3);
        assert_eq!(CursorType::from_repr(3), Some(CursorType::PenEraser));
        assert_eq!(CursorType::PenTip.as_ref(), "PenTip");
    }

    #[test]
    fn cursor_run_is_contiguous() {
        let run = Cursors {
            first: CursorId(3),
            count: 4,
        };
        let ids: Vec<_> = run.into_iter().map(|id| id.0).collect();
        assert_eq!(ids, [3, 4, 5, 6]);
        assert!(run.contains(CursorId(6)));
        assert!(!run.contains(CursorId(7)));
        assert!(!run.contains(CursorId(2)));
        assert_eq!(run.into_iter().size_hint(), (4, Some(4)));

        let empty = Cursors::default();
        assert!(empty.is_empty());
        assert_eq!(empty.into_iter().count(), 0);

        let edge = Cursors {
            first: CursorId(u32::MAX),
            count: 3,
        };
        assert_eq!(edge.into_iter().count(), 1);
    }

    #[test]
    fn button_bits() {
        let buttons = Buttons::from_bits_retain(0b1000_0101);
        assert!(buttons.contains(Buttons::PRIMARY));
        assert!(!buttons.contains(Buttons::SECONDARY));
        assert!(buttons.is_pressed(2));
        assert!(buttons.is_pressed(7));
        assert!(!buttons.is_pressed(8));
        assert!(!buttons.is_pressed(40));
        assert_eq!(buttons.bits(), 0b1000_0101);
    }
}
