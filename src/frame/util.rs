use super::Error;
use bytes::Bytes;

/// Strip padding from the given payload.
///
/// It is assumed that the frame had the PADDED flag set: the first octet is
/// the padding length and that many octets of padding close the payload. The
/// payload is narrowed in place to the actual content.
///
/// The padding length MUST be strictly less than the remaining payload, or
/// the frame is malformed.
pub fn strip_padding(payload: &mut Bytes) -> Result<u8, Error> {
    let payload_len = payload.len();
    if payload_len == 0 {
        // No room for the padding length octet itself.
        return Err(Error::TooMuchPadding);
    }

    let pad_len = payload[0] as usize;

    if pad_len >= payload_len {
        return Err(Error::TooMuchPadding);
    }

    let _ = payload.split_to(1);
    let _ = payload.split_off(payload_len - pad_len - 1);

    Ok(pad_len as u8)
}

/// Number of flow-controlled octets a padded payload occupied on the wire:
/// the content plus the padding length octet plus the padding itself.
pub fn flow_len(content_len: usize, pad_len: Option<u8>) -> usize {
    match pad_len {
        Some(n) => content_len + 1 + n as usize,
        None => content_len,
    }
}
