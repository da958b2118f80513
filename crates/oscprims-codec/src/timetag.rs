use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::{BufMut, BytesMut};

use crate::error::{CodecError, Result};
use crate::tags;

/// Seconds between the NTP epoch (1900-01-01) and the Unix epoch (1970-01-01).
pub const NTP_UNIX_OFFSET: u64 = 2_208_988_800;

/// Wire size of a time tag: seconds (4) + fraction (4).
pub const TIME_TAG_SIZE: usize = 8;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// NTP 64-bit fixed-point timestamp.
///
/// `seconds` counts from 1900-01-01 UTC, `fraction` is the sub-second part
/// scaled by 2^32. Both halves are unsigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeTag {
    /// Whole seconds since 1900-01-01 UTC.
    pub seconds: u32,
    /// Sub-second part in units of 2^-32 s.
    pub fraction: u32,
}

impl TimeTag {
    /// The special "execute immediately" value: 63 zero bits then a one.
    pub const IMMEDIATELY: TimeTag = TimeTag {
        seconds: 0,
        fraction: 1,
    };

    pub const fn new(seconds: u32, fraction: u32) -> Self {
        Self { seconds, fraction }
    }

    /// Build from the raw 64-bit fixed-point value.
    pub const fn from_bits(bits: u64) -> Self {
        Self {
            seconds: (bits >> 32) as u32,
            fraction: bits as u32,
        }
    }

    /// The raw 64-bit fixed-point value.
    pub const fn to_bits(self) -> u64 {
        ((self.seconds as u64) << 32) | self.fraction as u64
    }

    pub fn is_immediately(self) -> bool {
        self == Self::IMMEDIATELY
    }

    /// The current wall-clock time.
    ///
    /// Falls back to [`TimeTag::IMMEDIATELY`] if the clock reads a time that
    /// has no NTP era-0 representation.
    pub fn now() -> Self {
        Self::try_from(SystemTime::now()).unwrap_or(Self::IMMEDIATELY)
    }

    /// Convert back to a `SystemTime`.
    pub fn to_system_time(self) -> SystemTime {
        let nanos = (u64::from(self.fraction) * NANOS_PER_SEC) >> 32;
        let ntp = Duration::new(u64::from(self.seconds), nanos as u32);
        let offset = Duration::from_secs(NTP_UNIX_OFFSET);
        if ntp >= offset {
            UNIX_EPOCH + (ntp - offset)
        } else {
            UNIX_EPOCH - (offset - ntp)
        }
    }

    /// Append the 8-byte wire form.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(TIME_TAG_SIZE);
        dst.put_u32(self.seconds);
        dst.put_u32(self.fraction);
    }

    /// Decode a time tag from the front of `src`.
    pub fn decode(src: &[u8]) -> Result<(Self, &[u8])> {
        if src.len() < TIME_TAG_SIZE {
            return Err(CodecError::MalformedArgument {
                tag: tags::TIME_TAG,
                needed: TIME_TAG_SIZE,
                available: src.len(),
            });
        }
        let (head, rest) = src.split_at(TIME_TAG_SIZE);
        let seconds = u32::from_be_bytes([head[0], head[1], head[2], head[3]]);
        let fraction = u32::from_be_bytes([head[4], head[5], head[6], head[7]]);
        Ok((Self { seconds, fraction }, rest))
    }
}

impl Default for TimeTag {
    fn default() -> Self {
        Self::IMMEDIATELY
    }
}

impl TryFrom<SystemTime> for TimeTag {
    type Error = CodecError;

    fn try_from(time: SystemTime) -> Result<Self> {
        let offset = Duration::from_secs(NTP_UNIX_OFFSET);
        let since_ntp_epoch = match time.duration_since(UNIX_EPOCH) {
            Ok(after) => after + offset,
            Err(err) => offset.checked_sub(err.duration()).ok_or_else(|| {
                CodecError::ValueTypeMismatch("time is before the NTP epoch".to_string())
            })?,
        };

        let seconds = u32::try_from(since_ntp_epoch.as_secs()).map_err(|_| {
            CodecError::ValueTypeMismatch(format!(
                "{}s since 1900 does not fit in an NTP era-0 time tag",
                since_ntp_epoch.as_secs()
            ))
        })?;
        let fraction = ((u64::from(since_ntp_epoch.subsec_nanos()) << 32) / NANOS_PER_SEC) as u32;

        Ok(Self { seconds, fraction })
    }
}

impl fmt::Display for TimeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_immediately() {
            write!(f, "immediately")
        } else {
            write!(f, "0x{:08x}.{:08x}", self.seconds, self.fraction)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_immediately_wire_form() {
        let mut buf = BytesMut::new();
        TimeTag::IMMEDIATELY.encode(&mut buf);
        assert_eq!(buf.as_ref(), &[0, 0, 0, 0, 0, 0, 0, 1]);

        let (decoded, rest) = TimeTag::decode(&buf).unwrap();
        assert!(decoded.is_immediately());
        assert!(rest.is_empty());
    }

    #[test]
    fn test_bits_roundtrip() {
        let tag = TimeTag::from_bits(0xDEAD_BEEF_0000_0001);
        assert_eq!(tag.seconds, 0xDEAD_BEEF);
        assert_eq!(tag.fraction, 1);
        assert_eq!(tag.to_bits(), 0xDEAD_BEEF_0000_0001);
    }

    #[test]
    fn test_unix_epoch_maps_to_ntp_offset() {
        let tag = TimeTag::try_from(UNIX_EPOCH).unwrap();
        assert_eq!(u64::from(tag.seconds), NTP_UNIX_OFFSET);
        assert_eq!(tag.fraction, 0);
    }

    #[test]
    fn test_fraction_scaled_by_two_pow_32() {
        let half = UNIX_EPOCH + Duration::from_millis(500);
        let tag = TimeTag::try_from(half).unwrap();
        assert_eq!(tag.fraction, 0x8000_0000);
    }

    #[test]
    fn test_seconds_above_i32_max_stay_unsigned() {
        // 2024-ish timestamps have the top bit of the seconds field set.
        let tag = TimeTag::new(0xE9_00_00_00, 0);
        let mut buf = BytesMut::new();
        tag.encode(&mut buf);
        assert_eq!(&buf[..4], &[0xE9, 0, 0, 0]);
        assert_eq!(TimeTag::decode(&buf).unwrap().0, tag);
    }

    #[test]
    fn test_system_time_roundtrip_within_a_nanosecond() {
        let now = SystemTime::now();
        let tag = TimeTag::try_from(now).unwrap();
        let back = tag.to_system_time();
        let drift = match now.duration_since(back) {
            Ok(d) => d,
            Err(e) => e.duration(),
        };
        assert!(drift <= Duration::from_nanos(1));
    }

    #[test]
    fn test_pre_1900_is_rejected() {
        let before = UNIX_EPOCH - Duration::from_secs(NTP_UNIX_OFFSET + 1);
        assert!(matches!(
            TimeTag::try_from(before),
            Err(CodecError::ValueTypeMismatch(_))
        ));
    }

    #[test]
    fn test_decode_truncated() {
        let result = TimeTag::decode(&[0, 0, 0, 0, 0, 0, 0]);
        assert!(matches!(
            result,
            Err(CodecError::MalformedArgument {
                tag: 't',
                needed: 8,
                available: 7
            })
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(TimeTag::IMMEDIATELY.to_string(), "immediately");
        assert_eq!(
            TimeTag::new(3, 0x8000_0000).to_string(),
            "0x00000003.80000000"
        );
    }
}
