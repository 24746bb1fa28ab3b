//! # Valuators
//!
//! A valuator is a single continuous input axis of a tablet. Every opened device reports the same fixed set
//! of valuators, in the same order, as raw integer driver units. Use [`Access::valuator_range`](crate::access::Access::valuator_range)
//! to learn how to interpret them.

/// The fixed set of valuators. The discriminant is the valuator's index, which is stable.
#[derive(
    Clone,
    Copy,
    Debug,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    strum::EnumCount,
    strum::EnumIter,
    strum::AsRefStr,
    strum::FromRepr,
)]
#[repr(u8)]
pub enum Valuator {
    /// Horizontal position on the tablet surface.
    X = 0,
    /// Vertical position on the tablet surface.
    Y = 1,
    /// Force applied perpendicular to the tablet surface.
    Pressure = 2,
    /// Contact size of the cursor.
    ///
    /// **Note:** Wintab packets carry no contact size field, so real hardware always reports this as unsupported.
    Size = 3,
}
impl Valuator {
    /// Number of valuators.
    pub const COUNT: usize = <Self as strum::EnumCount>::COUNT;
    /// Look up a valuator by its stable index. `None` if out of range.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        u8::try_from(index).ok().and_then(Self::from_repr)
    }
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
    /// Iterate all valuators in index order.
    pub fn iter() -> impl Iterator<Item = Self> {
        <Self as strum::IntoEnumIterator>::iter()
    }
}

/// Inclusive physical bounds of a valuator, in raw driver units.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct Range {
    pub min: i32,
    pub max: i32,
}
impl Range {
    /// An empty range reports nothing meaningful - the driver claims `min > max`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }
    #[must_use]
    pub fn contains(&self, value: i32) -> bool {
        (self.min..=self.max).contains(&value)
    }
    /// Map a raw value onto `0.0..=1.0`. Values outside the range are not clamped.
    /// `None` if the range is zero-width or empty.
    #[must_use]
    pub fn normalize(&self, value: i32) -> Option<f32> {
        // i64 so that the full i32 span doesn't overflow.
        let width = i64::from(self.max) - i64::from(self.min);
        if width <= 0 {
            return None;
        }
        let offset = i64::from(value) - i64::from(self.min);
        // Lossless, both are well within f64's exact integer range.
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
        Some((offset as f64 / width as f64) as f32)
    }
}
impl From<std::ops::RangeInclusive<i32>> for Range {
    fn from(value: std::ops::RangeInclusive<i32>) -> Self {
        Self {
            min: *value.start(),
            max: *value.end(),
        }
    }
}

/// The last decoded value of every [`Valuator`], indexed by valuator.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub struct ValuatorValues(pub [i32; Valuator::COUNT]);
impl ValuatorValues {
    #[must_use]
    pub fn get(&self, valuator: Valuator) -> i32 {
        self.0[valuator.index()]
    }
    pub fn set(&mut self, valuator: Valuator, value: i32) {
        self.0[valuator.index()] = value;
    }
    #[must_use]
    pub fn as_array(&self) -> &[i32; Valuator::COUNT] {
        &self.0
    }
}
impl std::ops::Index<Valuator> for ValuatorValues {
    type Output = i32;
    fn index(&self, index: Valuator) -> &Self::Output {
        &self.0[index.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valuator_indices_are_fixed() {
        assert_eq!(Valuator::X.index(), 0);
        assert_eq!(Valuator::Y.index(), 1);
        assert_eq!(Valuator::Pressure.index(), 2);
        assert_eq!(Valuator::Size.index(), 3);
        assert_eq!(Valuator::COUNT, 4);
        assert_eq!(Valuator::from_index(2), Some(Valuator::Pressure));
        assert_eq!(Valuator::from_index(4), None);
        assert_eq!(
            Valuator::iter().collect::<Vec<_>>(),
            [Valuator::X, Valuator::Y, Valuator::Pressure, Valuator::Size]
        );
    }

    #[test]
    fn range_normalize() {
        let range = Range::from(0..=1023);
        assert_eq!(range.normalize(0), Some(0.0));
        assert_eq!(range.normalize(1023), Some(1.0));
        assert!(range.contains(512));
        assert!(!range.contains(1024));

        let flat = Range::from(5..=5);
        assert_eq!(flat.normalize(5), None);
        assert!(!flat.is_empty());
        assert!(Range { min: 1, max: 0 }.is_empty());

        // Extremes don't overflow.
        let full = Range::from(i32::MIN..=i32::MAX);
        assert_eq!(full.normalize(i32::MIN), Some(0.0));
        assert_eq!(full.normalize(i32::MAX), Some(1.0));
    }

    #[test]
    fn values_index_by_valuator() {
        let mut values = ValuatorValues::default();
        values.set(Valuator::Pressure, 700);
        assert_eq!(values[Valuator::Pressure], 700);
        assert_eq!(values.get(Valuator::X), 0);
        assert_eq!(values.as_array(), &[0, 0, 700, 0]);
    }
}
