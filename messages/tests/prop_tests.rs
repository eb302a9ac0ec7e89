use proptest::prelude::*;

use fedelect_messages::{ElectionMessage, Message, MessageType, VolunteerAudit};
use fedelect_types::{Position, Server, ServerId, Timestamp};

proptest! {
    /// Decoding arbitrary bytes never panics; it either yields a network
    /// message or an error.
    #[test]
    fn decode_arbitrary_bytes_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        if let Ok(message) = ElectionMessage::decode(&bytes) {
            prop_assert!(!message.message_type().is_internal());
        }
    }

    /// A volunteer survives the wire with its identity (hash) intact.
    #[test]
    fn volunteer_identity_survives_wire(
        id in prop::array::uniform32(0u8..),
        slot in 0u32..64,
        weight in any::<u64>(),
        height in any::<u32>(),
        minute in 0u8..10,
        round in 1u32..1000,
        ts in any::<u64>(),
    ) {
        let server = Server::new(ServerId::new(id), "audit").unwrap();
        let v = VolunteerAudit::new(&server, slot, weight, Position::new(height, minute), round, Timestamp::new(ts));
        let frame = ElectionMessage::from(v.clone()).encode().unwrap();
        prop_assert_eq!(frame[0], MessageType::VolunteerAudit.as_byte());
        let decoded = ElectionMessage::decode(&frame).unwrap();
        prop_assert_eq!(decoded.hash(), v.hash());
    }
}
