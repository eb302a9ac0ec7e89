#![no_main]

use fedelect_messages::ElectionMessage;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Decoding arbitrary bytes must never panic. Anything that decodes is a
    // wire message and must encode back to the same frame.
    if let Ok(message) = ElectionMessage::decode(data) {
        assert!(!message.message_type().is_internal());
        let encoded = message.encode().expect("decoded message re-encodes");
        assert_eq!(encoded, data);
    }
});
