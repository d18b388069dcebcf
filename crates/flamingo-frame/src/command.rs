use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Command frame size on the wire, markers included.
pub const COMMAND_FRAME_SIZE: usize = 128;

/// Sentinel that opens every command frame.
pub const START_MARKER: u32 = 0xF321_E654;

/// Sentinel that closes every command frame.
pub const END_MARKER: u32 = 0xFEDC_4321;

/// Zero-filled region between the additional byte count and the end marker.
pub const RESERVED_SIZE: usize = 72;

/// One protocol message exchanged with the NUC.
///
/// Wire format (little-endian, 128 bytes):
/// ```text
/// offset size field
///      0    4 start marker          0xF321E654
///      4    4 command               u32
///      8    4 status                i32
///     12    4 hardware_id           i32
///     16    4 subsystem_id          i32
///     20    4 client_id             i32
///     24   12 int_data[0..3]        i32 x 3 (axis selectors, parameters)
///     36    4 data_bits             u32 flags
///     40    8 double_data           f64 (target value, e.g. mm)
///     48    4 additional_data_bytes u32 trailing payload length
///     52   72 reserved              zero
///    124    4 end marker            0xFEDC4321
/// ```
///
/// A plain or parameterized command leaves `additional_data_bytes` at 0. A
/// workflow start sets it to the size of the workflow file that follows.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CommandFrame {
    pub command: u32,
    pub status: i32,
    pub hardware_id: i32,
    pub subsystem_id: i32,
    pub client_id: i32,
    pub int_data: [i32; 3],
    pub data_bits: u32,
    pub double_data: f64,
    pub additional_data_bytes: u32,
}

impl CommandFrame {
    /// A frame carrying only a command code.
    pub fn new(command: u32) -> Self {
        Self {
            command,
            ..Self::default()
        }
    }

    /// Set the three integer data slots.
    pub fn with_params(mut self, int_data: [i32; 3]) -> Self {
        self.int_data = int_data;
        self
    }

    /// Set the floating point data value.
    pub fn with_value(mut self, value: f64) -> Self {
        self.double_data = value;
        self
    }

    /// Set the flag/bits field.
    pub fn with_bits(mut self, bits: u32) -> Self {
        self.data_bits = bits;
        self
    }

    /// Set the status field.
    pub fn with_status(mut self, status: i32) -> Self {
        self.status = status;
        self
    }

    /// Set hardware, subsystem and client identifiers.
    pub fn with_ids(mut self, hardware_id: i32, subsystem_id: i32, client_id: i32) -> Self {
        self.hardware_id = hardware_id;
        self.subsystem_id = subsystem_id;
        self.client_id = client_id;
        self
    }

    /// Declare the number of raw bytes following this frame.
    pub fn with_additional_bytes(mut self, count: u32) -> Self {
        self.additional_data_bytes = count;
        self
    }

    /// True if the frame announces a trailing payload.
    pub fn has_trailing_payload(&self) -> bool {
        self.additional_data_bytes != 0
    }

    /// The total wire size of this frame plus its declared trailing payload.
    pub fn wire_size(&self) -> usize {
        COMMAND_FRAME_SIZE + self.additional_data_bytes as usize
    }

    /// Append the 128-byte wire form of this frame to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(COMMAND_FRAME_SIZE);
        dst.put_u32_le(START_MARKER);
        dst.put_u32_le(self.command);
        dst.put_i32_le(self.status);
        dst.put_i32_le(self.hardware_id);
        dst.put_i32_le(self.subsystem_id);
        dst.put_i32_le(self.client_id);
        for value in self.int_data {
            dst.put_i32_le(value);
        }
        dst.put_u32_le(self.data_bits);
        dst.put_f64_le(self.double_data);
        dst.put_u32_le(self.additional_data_bytes);
        dst.put_bytes(0, RESERVED_SIZE);
        dst.put_u32_le(END_MARKER);
    }

    /// The 128-byte wire form of this frame.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(COMMAND_FRAME_SIZE);
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Decode exactly one 128-byte frame.
    ///
    /// Both markers are checked; the reserved region is ignored.
    pub fn decode(src: &[u8]) -> Result<Self> {
        if src.len() != COMMAND_FRAME_SIZE {
            return Err(FrameError::InvalidLength {
                expected: COMMAND_FRAME_SIZE,
                actual: src.len(),
            });
        }

        let mut buf = src;
        let start = buf.get_u32_le();
        if start != START_MARKER {
            return Err(FrameError::InvalidStartMarker(start));
        }

        let frame = Self {
            command: buf.get_u32_le(),
            status: buf.get_i32_le(),
            hardware_id: buf.get_i32_le(),
            subsystem_id: buf.get_i32_le(),
            client_id: buf.get_i32_le(),
            int_data: [buf.get_i32_le(), buf.get_i32_le(), buf.get_i32_le()],
            data_bits: buf.get_u32_le(),
            double_data: buf.get_f64_le(),
            additional_data_bytes: buf.get_u32_le(),
        };

        buf.advance(RESERVED_SIZE);
        let end = buf.get_u32_le();
        if end != END_MARKER {
            return Err(FrameError::InvalidEndMarker(end));
        }

        Ok(frame)
    }
}

/// A decoded command frame together with its trailing payload.
///
/// `payload.len()` always equals `frame.additional_data_bytes`.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub frame: CommandFrame,
    pub payload: Bytes,
}

impl Response {
    pub fn new(frame: CommandFrame, payload: impl Into<Bytes>) -> Self {
        Self {
            frame,
            payload: payload.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage_move() -> CommandFrame {
        CommandFrame::new(24580)
            .with_params([1, 0, 0])
            .with_value(12.345)
            .with_ids(3, -1, 7)
            .with_status(-2)
            .with_bits(0x8000_0001)
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let frame = stage_move();
        let wire = frame.to_bytes();
        assert_eq!(wire.len(), COMMAND_FRAME_SIZE);

        let decoded = CommandFrame::decode(&wire).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_roundtrip_extremes() {
        let frames = [
            CommandFrame::default(),
            CommandFrame {
                command: u32::MAX,
                status: i32::MIN,
                hardware_id: i32::MAX,
                subsystem_id: i32::MIN,
                client_id: -1,
                int_data: [i32::MIN, 0, i32::MAX],
                data_bits: u32::MAX,
                double_data: f64::MAX,
                additional_data_bytes: u32::MAX,
            },
            CommandFrame::new(1).with_value(-0.000_001),
            CommandFrame::new(2).with_value(f64::NEG_INFINITY),
        ];

        for frame in frames {
            let decoded = CommandFrame::decode(&frame.to_bytes()).unwrap();
            assert_eq!(decoded, frame);
        }
    }

    #[test]
    fn test_field_offsets() {
        let frame = stage_move().with_additional_bytes(0x0102_0304);
        let wire = frame.to_bytes();

        let u32_at = |off: usize| u32::from_le_bytes(wire[off..off + 4].try_into().unwrap());
        let i32_at = |off: usize| i32::from_le_bytes(wire[off..off + 4].try_into().unwrap());

        assert_eq!(u32_at(0), START_MARKER);
        assert_eq!(u32_at(4), 24580);
        assert_eq!(i32_at(8), -2);
        assert_eq!(i32_at(12), 3);
        assert_eq!(i32_at(16), -1);
        assert_eq!(i32_at(20), 7);
        assert_eq!(i32_at(24), 1);
        assert_eq!(i32_at(28), 0);
        assert_eq!(i32_at(32), 0);
        assert_eq!(u32_at(36), 0x8000_0001);
        assert_eq!(
            f64::from_le_bytes(wire[40..48].try_into().unwrap()),
            12.345
        );
        assert_eq!(u32_at(48), 0x0102_0304);
        assert!(wire[52..124].iter().all(|&b| b == 0));
        assert_eq!(u32_at(124), END_MARKER);
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let wire = stage_move().to_bytes();
        for len in [0usize, 4, 127] {
            let err = CommandFrame::decode(&wire[..len]).unwrap_err();
            assert!(matches!(
                err,
                FrameError::InvalidLength { expected: 128, actual } if actual == len
            ));
        }

        let mut long = wire.to_vec();
        long.push(0);
        let err = CommandFrame::decode(&long).unwrap_err();
        assert!(matches!(err, FrameError::InvalidLength { actual: 129, .. }));
    }

    #[test]
    fn test_decode_rejects_tampered_start_marker() {
        let wire = stage_move().to_bytes();
        for i in 0..4 {
            let mut tampered = wire.to_vec();
            tampered[i] ^= 0xFF;
            let err = CommandFrame::decode(&tampered).unwrap_err();
            assert!(matches!(err, FrameError::InvalidStartMarker(_)));
        }
    }

    #[test]
    fn test_decode_rejects_tampered_end_marker() {
        let wire = stage_move().to_bytes();
        for i in 124..128 {
            let mut tampered = wire.to_vec();
            tampered[i] ^= 0x01;
            let err = CommandFrame::decode(&tampered).unwrap_err();
            assert!(matches!(err, FrameError::InvalidEndMarker(_)));
        }
    }

    #[test]
    fn test_decode_ignores_reserved_contents() {
        let frame = stage_move();
        let mut wire = frame.to_bytes().to_vec();
        wire[60] = 0xAA;
        assert_eq!(CommandFrame::decode(&wire).unwrap(), frame);
    }

    #[test]
    fn test_workflow_flavor() {
        let frame = CommandFrame::new(12292).with_additional_bytes(512);
        assert!(frame.has_trailing_payload());
        assert_eq!(frame.wire_size(), COMMAND_FRAME_SIZE + 512);
        assert!(!stage_move().has_trailing_payload());
    }

    #[test]
    fn test_encode_appends() {
        let mut buf = BytesMut::new();
        stage_move().encode(&mut buf);
        CommandFrame::new(9).encode(&mut buf);
        assert_eq!(buf.len(), 2 * COMMAND_FRAME_SIZE);

        let second = CommandFrame::decode(&buf[COMMAND_FRAME_SIZE..]).unwrap();
        assert_eq!(second.command, 9);
    }
}
