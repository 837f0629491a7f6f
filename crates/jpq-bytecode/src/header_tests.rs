use jpq_core::Mode;

use crate::header::{HEADER_SIZE, Header, LAX_FLAG, MAGIC, VERSION};

#[test]
fn lax_flag_lives_in_version_byte() {
    let lax = Header::new(Mode::Lax).to_bytes();
    let strict = Header::new(Mode::Strict).to_bytes();

    assert_eq!(lax[4], VERSION | LAX_FLAG);
    assert_eq!(strict[4], VERSION);
    assert_eq!(&lax[5..8], &[0, 0, 0]);
}

#[test]
fn bytes_round_trip() {
    let header = Header {
        external_count: 7,
        ..Header::new(Mode::Strict)
    };
    let bytes = header.to_bytes();
    assert_eq!(bytes.len(), HEADER_SIZE);

    let decoded = Header::from_bytes(&bytes);
    assert_eq!(decoded, header);
    assert!(decoded.validate_magic());
    assert!(decoded.validate_version());
}

#[test]
fn detects_foreign_buffers() {
    let mut bytes = Header::default().to_bytes();
    bytes[0] = b'X';
    assert!(!Header::from_bytes(&bytes).validate_magic());

    let mut bytes = Header::default().to_bytes();
    bytes[4] = LAX_FLAG | 9;
    let header = Header::from_bytes(&bytes);
    assert_eq!(header.magic, MAGIC);
    assert_eq!(header.version, 9);
    assert!(!header.validate_version());
    assert_eq!(header.mode, Mode::Lax);
}
