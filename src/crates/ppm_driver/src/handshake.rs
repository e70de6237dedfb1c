use std::io::{ErrorKind, Read};

use crate::error::{DriverError, DriverResult};

/// Marker the object server writes before any protocol traffic.
pub const HANDSHAKE: &[u8; 3] = b"PpM";

/// Consume the three handshake bytes from the start of the stream.
///
/// The marker is not newline terminated. A short stream counts as a mismatch.
pub fn wait_for_header<R: Read>(reader: &mut R) -> DriverResult<()> {
    let mut received = Vec::with_capacity(HANDSHAKE.len());
    let mut buf = [0u8; 3];
    while received.len() < HANDSHAKE.len() {
        let want = HANDSHAKE.len() - received.len();
        match reader.read(&mut buf[..want]) {
            Ok(0) => break,
            Ok(n) => received.extend_from_slice(&buf[..n]),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }

    if received.as_slice() == HANDSHAKE.as_slice() {
        Ok(())
    } else {
        Err(DriverError::Handshake { received })
    }
}
