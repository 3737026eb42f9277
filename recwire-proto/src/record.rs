//! Record payload carried inside DATA frames.

use crate::frame::WireError;

/// Maximum record name length in bytes.
pub const MAX_NAME_LEN: usize = 32;

/// Encoded record size in bytes: command(4) + id(4) + name(32) + age(4).
pub const RECORD_LEN: usize = 4 + 4 + MAX_NAME_LEN + 4;

/// Record command and response status codes.
///
/// Requests and responses share the tag space: a client sends `Add` or
/// `Retrieve`, the server answers with the outcome code for that operation.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Request: insert a new record
    Add = 0,
    /// Request: look up a record by id
    Retrieve = 1,
    /// Response: record inserted
    AddOk = 2,
    /// Response: a record with this id already exists
    AddDuplicate = 3,
    /// Response: record found, payload carries it
    RetrieveOk = 4,
    /// Response: no record with this id
    RetrieveMissing = 5,
}

impl Command {
    /// Convert from raw tag value.
    ///
    /// Returns `None` for unknown tags.
    #[inline]
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Add),
            1 => Some(Self::Retrieve),
            2 => Some(Self::AddOk),
            3 => Some(Self::AddDuplicate),
            4 => Some(Self::RetrieveOk),
            5 => Some(Self::RetrieveMissing),
            _ => None,
        }
    }
}

impl TryFrom<u32> for Command {
    type Error = ();

    #[inline]
    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_u32(value).ok_or(())
    }
}

/// One record of the tiny store, and the request/response payload shape.
///
/// The transport treats this as opaque data; only the server's store logic
/// interprets it. `name` must stay within [`MAX_NAME_LEN`] bytes; the
/// constructors truncate on a char boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub command: Command,
    /// Client-chosen key. Non-zero for requests.
    pub id: u32,
    pub name: String,
    pub age: u32,
}

impl Record {
    /// Build an add request.
    pub fn add(id: u32, name: &str, age: u32) -> Self {
        Self {
            command: Command::Add,
            id,
            name: clamp_name(name),
            age,
        }
    }

    /// Build a retrieve request for `id`.
    pub fn retrieve(id: u32) -> Self {
        Self {
            command: Command::Retrieve,
            id,
            name: String::new(),
            age: 0,
        }
    }

    /// Build a response carrying this record's data under a new command code.
    pub fn with_command(&self, command: Command) -> Self {
        Self {
            command,
            ..self.clone()
        }
    }

    /// Append the encoded record to `buf` (network byte order, fixed width).
    pub(crate) fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&(self.command as u32).to_be_bytes());
        buf.extend_from_slice(&self.id.to_be_bytes());

        let mut name = [0u8; MAX_NAME_LEN];
        let bytes = self.name.as_bytes();
        let len = bytes.len().min(MAX_NAME_LEN);
        name[..len].copy_from_slice(&bytes[..len]);
        buf.extend_from_slice(&name);

        buf.extend_from_slice(&self.age.to_be_bytes());
    }

    /// Parse a record from exactly [`RECORD_LEN`] bytes.
    pub(crate) fn read_from(buf: &[u8]) -> Result<Self, WireError> {
        debug_assert_eq!(buf.len(), RECORD_LEN);

        let tag = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
        let command = Command::from_u32(tag).ok_or(WireError::UnknownCommand(tag))?;
        let id = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);

        let name_bytes = &buf[8..8 + MAX_NAME_LEN];
        let end = name_bytes.iter().position(|&b| b == 0).unwrap_or(MAX_NAME_LEN);
        let name = std::str::from_utf8(&name_bytes[..end])
            .map_err(|_| WireError::InvalidName)?
            .to_string();

        let age = u32::from_be_bytes([buf[40], buf[41], buf[42], buf[43]]);

        Ok(Self {
            command,
            id,
            name,
            age,
        })
    }
}

/// Longest prefix of `name` that fits in [`MAX_NAME_LEN`] bytes without
/// splitting a character.
fn clamp_name(name: &str) -> String {
    if name.len() <= MAX_NAME_LEN {
        return name.to_string();
    }
    let mut end = MAX_NAME_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_string()
}
