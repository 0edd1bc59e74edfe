//! Reply envelope encoding.
//!
//! ```text
//! <identity> <len(conn_id)>:<conn_id>, <payload>
//! ```
//! The length prefix counts bytes of the connection-id field. The payload is copied as is.

use bytes::{BufMut, Bytes, BytesMut};

/// Most connection ids the proxy accepts in one bulk envelope. Callers chunk; we do not check.
pub const MAX_IDENTS: usize = 100;

/// Build one addressed reply.
pub fn encode(identity: &str, conn_id: &str, payload: &[u8]) -> Bytes {
    let header = format!("{} {}:{},", identity, conn_id.len(), conn_id);
    let mut buf = BytesMut::with_capacity(header.len() + 1 + payload.len());
    buf.put_slice(header.as_bytes());
    buf.put_u8(b' ');
    buf.put_slice(payload);
    buf.freeze()
}

/// Connection-id field addressing several clients at once.
pub fn join_idents<S: AsRef<str>>(idents: &[S]) -> String {
    idents
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_client_envelope() {
        assert_eq!(&encode("S1", "42", b"hi")[..], b"S1 2:42, hi");
    }

    #[test]
    fn length_prefix_counts_bulk_ids() {
        let ids = join_idents(&["1", "22", "333"]);
        assert_eq!(ids, "1 22 333");
        assert_eq!(&encode("S1", &ids, b"x")[..], b"S1 8:1 22 333, x");
    }

    #[test]
    fn empty_payload_still_has_separator() {
        assert_eq!(&encode("abc", "9", b"")[..], b"abc 1:9, ");
    }

    #[test]
    fn payload_bytes_are_untouched() {
        let payload = [0x00, 0xff, b',', b' ', 0x88];
        let env = encode("S", "1", &payload);
        assert_eq!(&env[env.len() - payload.len()..], &payload);
    }
}
