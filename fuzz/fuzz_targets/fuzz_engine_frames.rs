#![no_main]

use fedelect_crypto::server_id_from_name;
use fedelect_elections::{Elections, Roster};
use fedelect_messages::ElectionMessage;
use fedelect_types::{Position, Server, Timestamp};
use libfuzzer_sys::fuzz_target;

fn server(name: &str) -> Server {
    Server::new(server_id_from_name(name), name).unwrap()
}

fuzz_target!(|data: &[u8]| {
    // Split the input into frames on 0xFF and feed each decodable frame to
    // a leader's engine. Nothing may panic and `electing` must track sync.
    let roster = Roster::new(
        vec![server("L0"), server("L1"), server("L2")],
        vec![server("A0"), server("A1")],
    )
    .unwrap();
    let mut engine = Elections::new(server("L0"), roster, Position::new(0, 0));
    for frame in data.split(|b| *b == 0xFF) {
        if let Ok(message) = ElectionMessage::decode(frame) {
            engine.process(&message, Timestamp::new(0));
            let state = engine.state();
            assert_eq!(state.electing(), state.sync().first_unsynced());
        }
    }
});
