//! CT-API status codes and validation of the codes reported by the backend.

use std::fmt;

/// Result codes defined by CT-API.
/// Anything else coming from the backend is reported as [`Status::ErrHtsi`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum Status {
    /// Function call was successful.
    Ok = 0,

    /// Invalid parameter or value, also used for calls out of lifecycle order.
    ErrInvalid = -1,

    /// Card terminal error.
    ErrCt = -8,

    /// Transmission error.
    ErrTrans = -10,

    /// Memory assignment error in the host transport layer.
    ErrMemory = -11,

    /// Abort of the function by the host or the operating system.
    ErrHost = -127,

    /// HTSI error. Reused here for an unreachable or misbehaving backend.
    ErrHtsi = -128,
}

impl Status {
    pub const ALL: [Status; 7] = [
        Status::Ok,
        Status::ErrInvalid,
        Status::ErrCt,
        Status::ErrTrans,
        Status::ErrMemory,
        Status::ErrHost,
        Status::ErrHtsi,
    ];

    /// Returns the raw code passed over the ABI.
    pub const fn code(self) -> i8 {
        self as i8
    }

    /// Maps a raw code to a status, if the code is defined by CT-API.
    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| i64::from(s.code()) == code)
    }

    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }
}

impl From<Status> for i8 {
    fn from(status: Status) -> Self {
        status.code()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}

/// Validates a status code reported by the backend as text.
/// Total: any unparseable or undefined value becomes [`Status::ErrHtsi`].
pub fn validate(raw: &str) -> Status {
    match raw.trim().parse::<i64>().ok().and_then(Status::from_code) {
        Some(status) => status,
        None => {
            warn!("Backend reported an invalid status code: {:?}", raw);
            Status::ErrHtsi
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_every_defined_code() {
        for (raw, expected) in [
            ("0", Status::Ok),
            ("-1", Status::ErrInvalid),
            ("-8", Status::ErrCt),
            ("-10", Status::ErrTrans),
            ("-11", Status::ErrMemory),
            ("-127", Status::ErrHost),
            ("-128", Status::ErrHtsi),
        ] {
            assert_eq!(validate(raw), expected);
        }
    }

    #[test]
    fn collapses_undefined_codes() {
        for raw in ["1", "-12", "-120", "128", "-129", "99999999999999999999"] {
            assert_eq!(validate(raw), Status::ErrHtsi, "{raw}");
        }
    }

    #[test]
    fn collapses_garbage() {
        for raw in ["", "hello world", "0x00", "{}", "0.0"] {
            assert_eq!(validate(raw), Status::ErrHtsi, "{raw}");
        }
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        assert_eq!(validate(" -8\n"), Status::ErrCt);
    }

    #[test]
    fn codes_are_unique() {
        let codes: Vec<i8> = Status::ALL.iter().map(|s| s.code()).collect();
        assert_eq!(codes, vec![0, -1, -8, -10, -11, -127, -128]);
    }
}
