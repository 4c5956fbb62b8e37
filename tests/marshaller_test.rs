//! Typed read/write behaviour of ProcessMemory against the simulated facility

use proptest::prelude::*;
use rwmem::config::Config;
use rwmem::{Address, MemoryError, ProcessMemory, SimulatedFacility, TypedValue, ValueKind};
use std::sync::Arc;

const PID: u32 = 4242;
const BASE: usize = 0x0040_0000;

fn target() -> SimulatedFacility {
    SimulatedFacility::new()
        .with_process("explorer.exe", 100)
        .with_process("game.exe", PID)
        .with_zeroed(PID, BASE, 0x100)
}

fn attach(facility: SimulatedFacility) -> (Arc<SimulatedFacility>, ProcessMemory<SimulatedFacility>) {
    let facility = Arc::new(facility);
    let memory = ProcessMemory::attach(Arc::clone(&facility), "game.exe");
    assert!(memory.is_open(), "attach failed: {:?}", memory.attach_error());
    (facility, memory)
}

#[cfg(test)]
mod round_trip_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_numeric_round_trips() {
        let (_, memory) = attach(target());
        let at = Address::new(BASE);

        let cases = [
            TypedValue::Unsigned32(0xDEADBEEF),
            TypedValue::Signed32(i32::MIN),
            TypedValue::Byte(0x7F),
            TypedValue::Float32(-3.5),
        ];
        for value in cases {
            memory.write(at, &value).unwrap();
            assert_eq!(memory.read(at, 0, value.kind()).unwrap(), value);
        }
    }

    #[test]
    fn test_unsigned_max_reads_back_as_minus_one() {
        let (_, memory) = attach(target());
        let at = Address::new(BASE + 0x10);

        memory.write(at, &TypedValue::Unsigned32(0xFFFF_FFFF)).unwrap();

        assert_eq!(
            memory.read(at, 0, ValueKind::Unsigned32).unwrap(),
            TypedValue::Unsigned32(4294967295)
        );
        assert_eq!(
            memory.read(at, 0, ValueKind::Signed32).unwrap(),
            TypedValue::Signed32(-1)
        );
    }

    #[test]
    fn test_string_write_has_no_terminator() {
        let (facility, memory) = attach(target().with_region(PID, BASE + 0x20, b"xxxxxx"));

        memory
            .write(Address::new(BASE + 0x20), &TypedValue::from("hey"))
            .unwrap();

        assert_eq!(facility.peek(PID, BASE + 0x20, 6), Some(b"heyxxx".to_vec()));
        // No terminator was written, so the scan runs on to the old bytes
        assert_eq!(
            memory.read(Address::new(BASE + 0x20), 0, ValueKind::String).unwrap(),
            TypedValue::String("heyxxx".to_string())
        );
    }

    proptest! {
        #[test]
        fn prop_u32_round_trip(value: u32, offset in 0usize..0xFC) {
            let (_, memory) = attach(target());
            let at = Address::new(BASE + offset);
            memory.write(at, &TypedValue::Unsigned32(value)).unwrap();
            prop_assert_eq!(memory.read(at, 0, ValueKind::Unsigned32).unwrap(), TypedValue::Unsigned32(value));
        }

        #[test]
        fn prop_i32_round_trip(value: i32) {
            let (_, memory) = attach(target());
            let at = Address::new(BASE);
            memory.write(at, &TypedValue::Signed32(value)).unwrap();
            prop_assert_eq!(memory.read(at, 0, ValueKind::Signed32).unwrap(), TypedValue::Signed32(value));
        }

        #[test]
        fn prop_f32_round_trip_bits(bits: u32) {
            let (_, memory) = attach(target());
            let at = Address::new(BASE);
            memory.write(at, &TypedValue::Float32(f32::from_bits(bits))).unwrap();
            match memory.read(at, 0, ValueKind::Float32).unwrap() {
                TypedValue::Float32(read) => prop_assert_eq!(read.to_bits(), bits),
                other => prop_assert!(false, "unexpected {:?}", other),
            }
        }
    }
}

#[cfg(test)]
mod string_and_array_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_string_stops_at_first_zero() {
        let (_, memory) = attach(target().with_region(PID, 0x9000, &[b'h', b'i', 0x00, b'x']));

        assert_eq!(
            memory.read(Address::new(0x9000), 0, ValueKind::String).unwrap(),
            TypedValue::String("hi".to_string())
        );
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let (_, memory) = attach(target().with_region(PID, 0x9000, &[b'a', 0xFF, b'b', 0x00]));

        assert_eq!(
            memory.read(Address::new(0x9000), 0, ValueKind::String).unwrap(),
            TypedValue::String("a\u{FFFD}b".to_string())
        );
    }

    #[test]
    fn test_byte_array_prefix() {
        let (_, memory) = attach(target().with_region(PID, 0x9000, &[0x01, 0x02, 0x03, 0x04]));

        assert_eq!(
            memory.read(Address::new(0x9000), 3, ValueKind::ByteArray).unwrap(),
            TypedValue::ByteArray(vec![0x01, 0x02, 0x03])
        );
    }

    #[test]
    fn test_configured_read_limit() {
        let facility = Arc::new(target());
        let mut config = Config::default();
        config.memory.max_read_size = 8;
        let memory = ProcessMemory::attach_with_config(facility, "game.exe", &config);

        assert!(memory.read(Address::new(BASE), 8, ValueKind::ByteArray).is_ok());
        assert_eq!(
            memory.read(Address::new(BASE), 9, ValueKind::ByteArray).unwrap_err(),
            MemoryError::InvalidSize {
                kind: ValueKind::ByteArray,
                size: 9,
                limit: 8,
            }
        );
    }
}

#[cfg(test)]
mod failure_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_inaccessible_range_yields_read_failed() {
        let (_, memory) = attach(target().with_inaccessible(PID, BASE + 2, 1));

        for kind in [ValueKind::Unsigned32, ValueKind::Signed32, ValueKind::Float32] {
            assert!(matches!(
                memory.read(Address::new(BASE), 0, kind),
                Err(MemoryError::ReadFailed { .. })
            ));
        }
        assert!(matches!(
            memory.read(Address::new(BASE), 4, ValueKind::ByteArray),
            Err(MemoryError::ReadFailed { .. })
        ));
    }

    #[test]
    fn test_unreadable_byte_inside_string_discards_scan() {
        let (_, memory) = attach(
            target()
                .with_region(PID, 0x9000, b"abcd\0")
                .with_inaccessible(PID, 0x9002, 1),
        );

        assert!(matches!(
            memory.read(Address::new(0x9000), 0, ValueKind::String),
            Err(MemoryError::ReadFailed { .. })
        ));
        assert_eq!(
            memory.read(Address::new(0x9000), 2, ValueKind::ByteArray).unwrap(),
            TypedValue::ByteArray(b"ab".to_vec())
        );
    }

    #[test]
    fn test_failed_write_leaves_memory_untouched() {
        let (facility, memory) = attach(target().with_region(PID, 0xA000, &[1, 2]));

        assert!(matches!(
            memory.write(Address::new(0xA000), &TypedValue::Unsigned32(0)),
            Err(MemoryError::WriteFailed { .. })
        ));
        assert_eq!(facility.peek(PID, 0xA000, 2), Some(vec![1, 2]));
    }

    #[test]
    fn test_process_exit_surfaces_lazily() {
        let (facility, memory) = attach(target());
        facility.exit_process(PID);

        assert!(memory.is_open());
        assert!(matches!(
            memory.read(Address::new(BASE), 0, ValueKind::Byte),
            Err(MemoryError::ReadFailed { .. })
        ));
    }

    #[test]
    fn test_out_of_enum_tags() {
        let (_, memory) = attach(target());

        for tag in [6u8, 7, 0xFF] {
            assert!(matches!(
                memory.read_tagged(Address::new(BASE), 4, tag),
                Err(MemoryError::InvalidDataType(_))
            ));
            assert!(matches!(
                memory.write_tagged(Address::new(BASE), tag, &TypedValue::Byte(0)),
                Err(MemoryError::InvalidDataType(_))
            ));
        }
    }

    #[test]
    fn test_byte_array_is_read_only() {
        let (_, memory) = attach(target());

        assert!(matches!(
            memory.write(Address::new(BASE), &TypedValue::ByteArray(vec![0xAA])),
            Err(MemoryError::InvalidDataType(_))
        ));
    }
}

#[cfg(test)]
mod degraded_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unresolved_process_makes_no_facility_calls() {
        let facility = Arc::new(target());
        let memory = ProcessMemory::attach(Arc::clone(&facility), "absent.exe");
        let calls = facility.calls();

        assert!(!memory.is_open());
        assert!(memory.process().is_none());
        assert_eq!(
            memory.attach_error(),
            Some(&MemoryError::ProcessNotFound("absent.exe".to_string()))
        );

        for kind in ValueKind::ALL {
            assert!(memory.read(Address::new(BASE), 4, kind).unwrap_err().is_not_open());
        }
        assert!(memory
            .write(Address::new(BASE), &TypedValue::Unsigned32(1))
            .unwrap_err()
            .is_not_open());
        assert_eq!(facility.calls(), calls);
    }

    #[test]
    fn test_denied_open_is_recorded() {
        let facility = Arc::new(target().denying_open(PID));
        let memory = ProcessMemory::attach(facility, "game.exe");

        assert!(!memory.is_open());
        assert!(matches!(
            memory.attach_error(),
            Some(MemoryError::PrivilegeDenied { pid: PID, .. })
        ));
    }

    #[test]
    fn test_rejected_config_makes_no_facility_calls() {
        let facility = Arc::new(target());
        let mut config = Config::default();
        config.memory.max_read_size = 0;

        let memory = ProcessMemory::attach_with_config(Arc::clone(&facility), "game.exe", &config);

        assert!(!memory.is_open());
        assert!(matches!(memory.attach_error(), Some(MemoryError::InvalidConfig(_))));
        assert!(memory
            .read(Address::new(BASE), 3, ValueKind::ByteArray)
            .unwrap_err()
            .is_not_open());
        assert_eq!(facility.calls(), 0);
    }

    #[test]
    fn test_dropping_marshaller_closes_session_once() {
        let facility = Arc::new(target());
        {
            let memory = ProcessMemory::attach(Arc::clone(&facility), "game.exe");
            assert!(memory.is_open());
            assert_eq!(facility.open_handle_count(), 1);
        }
        assert_eq!(facility.open_handle_count(), 0);
        assert_eq!(facility.closed_count(), 1);
    }
}
