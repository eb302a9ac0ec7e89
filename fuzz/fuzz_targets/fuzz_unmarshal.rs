#![no_main]

use fedelect_messages::{LeaderSynced, Message, TimeoutInternal, VolunteerAck, VolunteerAudit};
use libfuzzer_sys::fuzz_target;

fn check<M: Message + Default>(data: &[u8]) {
    let mut message = M::default();
    if let Ok(rest) = message.unmarshal_binary_data(data) {
        // The remainder is always a suffix of the input.
        assert!(rest.len() <= data.len());
        assert_eq!(rest, &data[data.len() - rest.len()..]);
        let _ = message.validate();
        let _ = message.hash();
    }
}

fuzz_target!(|data: &[u8]| {
    check::<VolunteerAudit>(data);
    check::<VolunteerAck>(data);
    check::<TimeoutInternal>(data);
    check::<LeaderSynced>(data);
});
