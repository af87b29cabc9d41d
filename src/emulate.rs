//! Card-emulation response handling.
//!
//! The session object is owned by whoever drives the emulation
//! service and passed into the command handler — there is no
//! process-wide state.

/// Command processed, response data follows
pub const SW_SUCCESS: [u8; 2] = [0x90, 0x00];
/// Unknown or unprocessable command
pub const SW_UNKNOWN: [u8; 2] = [0x6F, 0x00];
/// Application not found (emulation inactive)
pub const SW_NOT_FOUND: [u8; 2] = [0x6A, 0x82];

/// One emulation session's state.
#[derive(Debug, Clone, Default)]
pub struct EmulationSession {
    active: bool,
    response_data: Option<Vec<u8>>,
}

impl EmulationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the payload returned to the reader.
    pub fn with_response(mut self, data: Vec<u8>) -> Self {
        self.response_data = Some(data);
        self
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Answer one command APDU from the reader.
    pub fn process_command(&self, apdu: &[u8]) -> Vec<u8> {
        if apdu.len() < 4 {
            return SW_UNKNOWN.to_vec();
        }
        if !self.active {
            return SW_NOT_FOUND.to_vec();
        }

        // SELECT AID: CLA=00 INS=A4 P1=04
        let select_aid = apdu[0] == 0x00 && apdu[1] == 0xA4 && apdu[2] == 0x04;
        match (&self.response_data, select_aid) {
            (Some(data), _) => {
                let mut response = data.clone();
                response.extend_from_slice(&SW_SUCCESS);
                response
            }
            (None, true) => SW_SUCCESS.to_vec(),
            (None, false) => SW_UNKNOWN.to_vec(),
        }
    }
}
