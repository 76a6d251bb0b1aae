// Control commands
pub const CMD_GETVERSION: u8 = 0x00;
pub const CMD_SIMSTEP: u8 = 0x02;
pub const CMD_CLOSE: u8 = 0x7F;

// Variable access commands; responses are the command id + 0x10
pub const CMD_GET_TL_VARIABLE: u8 = 0xA2;
pub const CMD_SET_TL_VARIABLE: u8 = 0xC2;
pub const CMD_GET_SIM_VARIABLE: u8 = 0xAB;
pub const RESPONSE_OFFSET: u8 = 0x10;

// Variables
pub const TL_PHASE_INDEX: u8 = 0x22;
pub const TL_CURRENT_PHASE: u8 = 0x28;
pub const VAR_MIN_EXPECTED_VEHICLES: u8 = 0x7D;

// Value types
pub const TYPE_INTEGER: u8 = 0x09;

// Status results
pub const RTYPE_OK: u8 = 0x00;
pub const RTYPE_NOTIMPLEMENTED: u8 = 0x01;
pub const RTYPE_ERR: u8 = 0xFF;
