#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub code_num: u16,
    pub message: &'static str,
}

impl Status {
    pub const OK: Status = Status {
        code_num: 200,
        message: "OK",
    };
    pub const CREATED: Status = Status {
        code_num: 201,
        message: "Created",
    };
    pub const BAD_REQUEST: Status = Status {
        code_num: 400,
        message: "Bad Request",
    };
    pub const NOT_FOUND: Status = Status {
        code_num: 404,
        message: "Not Found",
    };
    pub const INTERNAL_SERVER_ERROR: Status = Status {
        code_num: 500,
        message: "Internal Server Error",
    };

    /// Reason phrase used for codes outside the table.
    pub const UNKNOWN_MESSAGE: &str = "Unknown";

    pub fn from_code(code_num: u16) -> Status {
        let message = match code_num {
            200 => Self::OK.message,
            201 => Self::CREATED.message,
            400 => Self::BAD_REQUEST.message,
            404 => Self::NOT_FOUND.message,
            500 => Self::INTERNAL_SERVER_ERROR.message,
            _ => Self::UNKNOWN_MESSAGE,
        };
        Status { code_num, message }
    }
}
