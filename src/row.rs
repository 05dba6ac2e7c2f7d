//! Fixed-width row codec.
//!
//! A serialized row is always [`ROW_SIZE`] bytes:
//!
//! ```text
//! offset 0      4                  37                         293
//!        ┌──────┬──────────────────┬──────────────────────────┐
//!        │  id  │ username (33 B)  │ email (256 B)            │
//!        └──────┴──────────────────┴──────────────────────────┘
//! ```
//!
//! `id` is little-endian. String fields are copied verbatim and the rest of
//! their slot is zero-filled, so every encode rewrites all `ROW_SIZE` bytes
//! and decoding stops at the first NUL.

use std::fmt;

use crate::error::PrepareError;
use crate::{
    COLUMN_EMAIL_SIZE, COLUMN_USERNAME_SIZE, EMAIL_OFFSET, EMAIL_SIZE, ID_OFFSET, ID_SIZE,
    ROW_SIZE, USERNAME_OFFSET, USERNAME_SIZE,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    id: u32,
    username: String,
    email: String,
}

impl Row {
    /// Build a row, rejecting strings that do not fit their column.
    pub fn new(
        id: u32,
        username: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, PrepareError> {
        let username = username.into();
        let email = email.into();
        if username.len() > COLUMN_USERNAME_SIZE || email.len() > COLUMN_EMAIL_SIZE {
            return Err(PrepareError::StringTooLong);
        }
        Ok(Self {
            id,
            username,
            email,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Write this row into `dest`, which must be exactly one row slot.
    pub fn serialize(&self, dest: &mut [u8]) {
        debug_assert_eq!(dest.len(), ROW_SIZE, "row slot has the wrong length");

        dest[ID_OFFSET..ID_OFFSET + ID_SIZE].copy_from_slice(&self.id.to_le_bytes());
        write_field(
            &mut dest[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE],
            &self.username,
        );
        write_field(&mut dest[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE], &self.email);
    }

    /// Read a row back out of a slot written by [`Row::serialize`].
    pub fn deserialize(src: &[u8]) -> Self {
        debug_assert_eq!(src.len(), ROW_SIZE, "row slot has the wrong length");

        let mut id = [0u8; ID_SIZE];
        id.copy_from_slice(&src[ID_OFFSET..ID_OFFSET + ID_SIZE]);

        Self {
            id: u32::from_le_bytes(id),
            username: read_field(&src[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE]),
            email: read_field(&src[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE]),
        }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username, self.email)
    }
}

fn write_field(slot: &mut [u8], value: &str) {
    let bytes = value.as_bytes();
    slot[..bytes.len()].copy_from_slice(bytes);
    slot[bytes.len()..].fill(0);
}

fn read_field(slot: &[u8]) -> String {
    let end = slot.iter().position(|&b| b == 0).unwrap_or(slot.len());
    String::from_utf8_lossy(&slot[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_layout_offsets() {
        assert_eq!(ID_OFFSET, 0);
        assert_eq!(USERNAME_OFFSET, 4);
        assert_eq!(EMAIL_OFFSET, 37);
        assert_eq!(ROW_SIZE, 4 + 33 + 256);
    }

    #[test]
    fn test_serialize_writes_fixed_fields() {
        let row = Row::new(0x0102_0304, "bob", "bob@x.com").unwrap();
        let mut buf = vec![0xAA; ROW_SIZE];

        row.serialize(&mut buf);

        assert_eq!(&buf[0..4], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&buf[4..7], b"bob");
        assert!(buf[7..EMAIL_OFFSET].iter().all(|&b| b == 0));
        assert_eq!(&buf[37..46], b"bob@x.com");
        assert!(buf[46..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_shorter_value_clears_previous_contents() {
        let mut buf = vec![0u8; ROW_SIZE];
        Row::new(1, "a".repeat(32), "b".repeat(255))
            .unwrap()
            .serialize(&mut buf);
        Row::new(2, "x", "y").unwrap().serialize(&mut buf);

        let row = Row::deserialize(&buf);
        assert_eq!(row.username(), "x");
        assert_eq!(row.email(), "y");
    }

    #[test]
    fn test_max_length_fields() {
        let row = Row::new(7, "a".repeat(32), "e".repeat(255)).unwrap();
        let mut buf = vec![0u8; ROW_SIZE];
        row.serialize(&mut buf);

        assert_eq!(buf[USERNAME_OFFSET + COLUMN_USERNAME_SIZE], 0);
        assert_eq!(buf[EMAIL_OFFSET + COLUMN_EMAIL_SIZE], 0);
        assert_eq!(Row::deserialize(&buf), row);
    }

    #[test]
    fn test_new_rejects_long_strings() {
        assert_eq!(
            Row::new(1, "a".repeat(33), "e@x.com"),
            Err(PrepareError::StringTooLong)
        );
        assert_eq!(
            Row::new(1, "bob", "e".repeat(256)),
            Err(PrepareError::StringTooLong)
        );
    }

    #[test]
    fn test_zeroed_slot_decodes_to_empty_row() {
        let row = Row::deserialize(&[0u8; ROW_SIZE]);
        assert_eq!(row, Row::new(0, "", "").unwrap());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "row slot has the wrong length")]
    fn test_serialize_rejects_short_slot() {
        let row = Row::new(1, "bob", "bob@x.com").unwrap();
        row.serialize(&mut [0u8; ROW_SIZE - 1]);
    }

    #[test]
    fn test_display() {
        let row = Row::new(1, "alice", "alice@x.com").unwrap();
        assert_eq!(row.to_string(), "(1, alice, alice@x.com)");
    }

    proptest! {
        #[test]
        fn serialize_deserialize_prop(
            id in any::<u32>(),
            username in "[a-zA-Z0-9_.]{0,32}",
            email in "[a-zA-Z0-9_.@]{0,255}",
        ) {
            let row = Row::new(id, username, email).unwrap();
            let mut buf = vec![0u8; ROW_SIZE];
            row.serialize(&mut buf);
            prop_assert_eq!(Row::deserialize(&buf), row);
        }
    }
}
